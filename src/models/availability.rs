use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// One stylist's working window for one weekday. `day_of_week` counts from
/// Sunday = 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Availability {
    pub stylist_id: String,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

impl Availability {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.day_of_week > 6 {
            return Err(anyhow::anyhow!("invalid day_of_week: {}", self.day_of_week));
        }
        let start = parse_time(&self.start_time)?;
        let end = parse_time(&self.end_time)?;
        if start >= end {
            return Err(anyhow::anyhow!(
                "start_time {} must be before end_time {}",
                self.start_time,
                self.end_time
            ));
        }
        Ok(())
    }

    /// Working window in minutes since midnight, or `None` when the stylist
    /// does not work that day.
    pub fn window(&self) -> anyhow::Result<Option<(u32, u32)>> {
        if !self.is_available {
            return Ok(None);
        }
        Ok(Some((parse_time(&self.start_time)?, parse_time(&self.end_time)?)))
    }

    pub fn to_human_readable(&self) -> String {
        let day = DAY_NAMES
            .get(self.day_of_week as usize)
            .copied()
            .unwrap_or("?");
        if self.is_available {
            format!("{day}: {}-{}", self.start_time, self.end_time)
        } else {
            format!("{day}: closed")
        }
    }
}

pub fn weekday_index(date: &NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| anyhow::anyhow!("invalid date: {s}"))
}

/// Parses a wall-clock "HH:MM" into minutes since midnight.
pub fn parse_time(s: &str) -> anyhow::Result<u32> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 || parts[0].len() != 2 || parts[1].len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(anyhow::anyhow!("time out of range: {s}"));
    }
    Ok(hour * 60 + minute)
}

pub fn format_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
