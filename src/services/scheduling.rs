use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::models::availability::{format_time, parse_time, weekday_index};
use crate::models::{Booking, Stylist};

/// Candidate start times are generated on this grid.
pub const SLOT_STEP_MINUTES: u32 = 5;
/// Duration assumed when slots are listed without a service.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;
/// Upper bound for a service duration or a stylist buffer.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("the stylist does not work on {day}")]
    NotWorking { day: String },

    #[error("requested time is outside working hours ({hours})")]
    OutsideWorkingHours { hours: String },

    #[error("slot overlaps an existing booking from {start} to {end} (buffer {buffer} min)")]
    Conflict {
        start: String,
        end: String,
        buffer: u32,
    },

    #[error("{duration} min plus a {buffer} min buffer does not fit in a day")]
    TooLong { duration: u32, buffer: u32 },

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// An occupied span in minutes since midnight, half-open `[start, end)`.
/// `end` already includes the stylist's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    /// Whether a proposal starting at `start` and ending (buffer included) at
    /// `end_with_buffer` stays clear of this interval.
    pub fn is_clear_of(&self, start: u32, end_with_buffer: u32) -> bool {
        start >= self.end || end_with_buffer <= self.start
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Slot {
    pub time: String,
    pub available: bool,
}

pub fn occupied_intervals(bookings: &[Booking], buffer: u32) -> anyhow::Result<Vec<Interval>> {
    bookings
        .iter()
        .filter(|b| b.status.occupies_calendar())
        .map(|b| -> anyhow::Result<Interval> {
            Ok(Interval {
                start: parse_time(&b.start_time)?,
                end: parse_time(&b.end_time)?.saturating_add(buffer),
            })
        })
        .collect()
}

/// Free start times inside `window` for a booking of `duration` minutes
/// followed by `buffer` idle minutes, ascending.
pub fn free_slots(window: (u32, u32), duration: u32, buffer: u32, occupied: &[Interval]) -> Vec<Slot> {
    let (open, close) = window;
    let Some(needed) = duration.checked_add(buffer) else {
        return vec![];
    };
    let last_start = match close.checked_sub(needed) {
        Some(last) if last >= open => last,
        _ => return vec![],
    };

    (open..=last_start)
        .step_by(SLOT_STEP_MINUTES as usize)
        .filter(|&t| {
            // t <= close - needed, so this stays below `close`
            let end_with_buffer = t + needed;
            occupied.iter().all(|o| o.is_clear_of(t, end_with_buffer))
        })
        .map(|t| Slot {
            time: format_time(t),
            available: true,
        })
        .collect()
}

/// Rejects a proposal that collides with any occupying booking, naming the
/// first collision found.
pub fn check_conflict(
    start: u32,
    duration: u32,
    buffer: u32,
    existing: &[Booking],
) -> Result<(), SchedulingError> {
    let end_with_buffer = start
        .checked_add(duration)
        .and_then(|end| end.checked_add(buffer))
        .ok_or(SchedulingError::TooLong { duration, buffer })?;

    for booking in existing.iter().filter(|b| b.status.occupies_calendar()) {
        let occupied = Interval {
            start: parse_time(&booking.start_time)?,
            end: parse_time(&booking.end_time)?.saturating_add(buffer),
        };
        if !occupied.is_clear_of(start, end_with_buffer) {
            return Err(SchedulingError::Conflict {
                start: booking.start_time.clone(),
                end: booking.end_time.clone(),
                buffer,
            });
        }
    }

    Ok(())
}

/// Lists bookable start times for `stylist` on `date`. Callers are expected
/// to have checked that the salon and stylist are active.
pub fn available_slots(
    conn: &Connection,
    stylist: &Stylist,
    date: &NaiveDate,
    duration: u32,
) -> anyhow::Result<Vec<Slot>> {
    let availability = queries::get_availability(conn, &stylist.id, weekday_index(date))?;
    let window = match availability {
        Some(a) => match a.window()? {
            Some(window) => window,
            None => return Ok(vec![]),
        },
        None => return Ok(vec![]),
    };

    let buffer = stylist.buffer();
    let date_str = date.format("%Y-%m-%d").to_string();
    let bookings = queries::get_occupying_bookings(conn, &stylist.id, &date_str)?;
    let occupied = occupied_intervals(&bookings, buffer)?;

    Ok(free_slots(window, duration, buffer, &occupied))
}

/// Re-validates a requested start right before it is booked: the booking and
/// its buffer must fit the stylist's working window and must not collide with
/// any pending or confirmed booking. Returns the end time in minutes.
///
/// Run this on the same transaction that inserts the booking.
pub fn validate_booking_time(
    conn: &Connection,
    stylist: &Stylist,
    date: &NaiveDate,
    start: u32,
    duration: u32,
) -> Result<u32, SchedulingError> {
    let day = date.format("%A %Y-%m-%d").to_string();
    let availability = queries::get_availability(conn, &stylist.id, weekday_index(date))?
        .ok_or_else(|| SchedulingError::NotWorking { day: day.clone() })?;
    let (open, close) = availability
        .window()?
        .ok_or(SchedulingError::NotWorking { day })?;

    let buffer = stylist.buffer();
    let (end, end_with_buffer) = start
        .checked_add(duration)
        .and_then(|end| Some((end, end.checked_add(buffer)?)))
        .ok_or(SchedulingError::TooLong { duration, buffer })?;
    if start < open || end_with_buffer > close {
        return Err(SchedulingError::OutsideWorkingHours {
            hours: availability.to_human_readable(),
        });
    }

    let date_str = date.format("%Y-%m-%d").to_string();
    let existing = queries::get_occupying_bookings(conn, &stylist.id, &date_str)?;
    check_conflict(start, duration, buffer, &existing)?;

    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;
    use crate::models::BookingStatus;

    fn minutes(s: &str) -> u32 {
        parse_time(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // 2030-06-17 is a Monday
    const MONDAY: &str = "2030-06-17";

    #[test]
    fn test_free_slots_empty_calendar() {
        let slots = free_slots((minutes("09:00"), minutes("10:00")), 30, 5, &[]);
        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(
            times,
            vec!["09:00", "09:05", "09:10", "09:15", "09:20", "09:25"]
        );
        assert!(slots.iter().all(|s| s.available));
    }

    #[test]
    fn test_free_slots_respect_close_with_buffer() {
        let (open, close) = (minutes("09:00"), minutes("18:00"));
        let slots = free_slots((open, close), 45, 10, &[]);
        for slot in &slots {
            assert!(minutes(&slot.time) + 45 + 10 <= close);
        }
        assert_eq!(slots.last().unwrap().time, "17:05");
    }

    #[test]
    fn test_free_slots_window_too_short() {
        assert!(free_slots((minutes("09:00"), minutes("09:20")), 30, 5, &[]).is_empty());
    }

    #[test]
    fn test_free_slots_skip_occupied_with_buffer() {
        // existing 10:00-10:30, buffer 5 => occupied [10:00, 10:35)
        let occupied = [Interval {
            start: minutes("10:00"),
            end: minutes("10:35"),
        }];
        let slots = free_slots((minutes("09:00"), minutes("12:00")), 30, 5, &occupied);
        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();

        // last slot before the booking must end (plus buffer) by 10:00
        assert!(times.contains(&"09:25"));
        assert!(!times.contains(&"09:30"));
        assert!(!times.contains(&"10:00"));
        assert!(!times.contains(&"10:30"));
        assert!(times.contains(&"10:35"));
    }

    #[test]
    fn test_free_slots_idempotent() {
        let occupied = [Interval {
            start: minutes("11:00"),
            end: minutes("12:05"),
        }];
        let a = free_slots((minutes("09:00"), minutes("18:00")), 30, 5, &occupied);
        let b = free_slots((minutes("09:00"), minutes("18:00")), 30, 5, &occupied);
        assert_eq!(a, b);
    }

    #[test]
    fn test_available_slots_unavailable_day_is_empty() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        fixtures::set_day(&conn, &ids.stylist_id, 1, "09:00", "18:00", false);
        let stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();

        let slots = available_slots(&conn, &stylist, &date(MONDAY), 30).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_available_slots_without_availability_row_is_empty() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        let stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();

        let slots = available_slots(&conn, &stylist, &date(MONDAY), 30).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_available_slots_never_overlap_existing() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        fixtures::set_day(&conn, &ids.stylist_id, 1, "09:00", "18:00", true);
        fixtures::insert_booking(&conn, &ids, MONDAY, "10:00", "10:30", BookingStatus::Confirmed);
        fixtures::insert_booking(&conn, &ids, MONDAY, "14:00", "15:00", BookingStatus::Pending);
        let stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();

        let slots = available_slots(&conn, &stylist, &date(MONDAY), 30).unwrap();
        assert!(!slots.is_empty());
        let busy = [(minutes("10:00"), minutes("10:35")), (minutes("14:00"), minutes("15:05"))];
        for slot in &slots {
            let start = minutes(&slot.time);
            let end = start + 30 + 5;
            for (b_start, b_end) in busy {
                assert!(start >= b_end || end <= b_start, "slot {} overlaps", slot.time);
            }
        }
    }

    #[test]
    fn test_cancelled_bookings_do_not_block() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        fixtures::set_day(&conn, &ids.stylist_id, 1, "09:00", "18:00", true);
        fixtures::insert_booking(&conn, &ids, MONDAY, "10:00", "10:30", BookingStatus::Cancelled);
        fixtures::insert_booking(&conn, &ids, MONDAY, "11:00", "11:30", BookingStatus::Completed);
        let stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();

        let slots = available_slots(&conn, &stylist, &date(MONDAY), 30).unwrap();
        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        assert!(times.contains(&"10:00"));
        assert!(times.contains(&"11:00"));
    }

    #[test]
    fn test_booking_inside_buffer_conflicts() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        fixtures::set_day(&conn, &ids.stylist_id, 1, "09:00", "18:00", true);
        fixtures::insert_booking(&conn, &ids, MONDAY, "10:00", "10:30", BookingStatus::Confirmed);
        let stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();

        let result = validate_booking_time(&conn, &stylist, &date(MONDAY), minutes("10:30"), 30);
        match result {
            Err(SchedulingError::Conflict { start, end, buffer }) => {
                assert_eq!(start, "10:00");
                assert_eq!(end, "10:30");
                assert_eq!(buffer, 5);
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        let result = validate_booking_time(&conn, &stylist, &date(MONDAY), minutes("10:34"), 30);
        assert!(matches!(result, Err(SchedulingError::Conflict { .. })));
    }

    #[test]
    fn test_booking_right_after_buffer_succeeds() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        fixtures::set_day(&conn, &ids.stylist_id, 1, "09:00", "18:00", true);
        fixtures::insert_booking(&conn, &ids, MONDAY, "10:00", "10:30", BookingStatus::Confirmed);
        let stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();

        let end = validate_booking_time(&conn, &stylist, &date(MONDAY), minutes("10:35"), 30).unwrap();
        assert_eq!(format_time(end), "11:05");
    }

    #[test]
    fn test_booking_ending_into_next_buffer_conflicts() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        fixtures::set_day(&conn, &ids.stylist_id, 1, "09:00", "18:00", true);
        fixtures::insert_booking(&conn, &ids, MONDAY, "10:00", "10:30", BookingStatus::Confirmed);
        let stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();

        // 09:30 + 30 + 5 = 10:05, one booking's buffer reaches into the next
        let result = validate_booking_time(&conn, &stylist, &date(MONDAY), minutes("09:30"), 30);
        assert!(matches!(result, Err(SchedulingError::Conflict { .. })));
        assert!(validate_booking_time(&conn, &stylist, &date(MONDAY), minutes("09:25"), 30).is_ok());
    }

    #[test]
    fn test_booking_outside_hours() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        fixtures::set_day(&conn, &ids.stylist_id, 1, "09:00", "18:00", true);
        let stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();

        let early = validate_booking_time(&conn, &stylist, &date(MONDAY), minutes("08:30"), 30);
        assert!(matches!(early, Err(SchedulingError::OutsideWorkingHours { .. })));

        // 17:30 + 30 + 5 buffer runs past 18:00
        let late = validate_booking_time(&conn, &stylist, &date(MONDAY), minutes("17:30"), 30);
        assert!(matches!(late, Err(SchedulingError::OutsideWorkingHours { .. })));
    }

    #[test]
    fn test_booking_on_day_off() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        let stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();

        let result = validate_booking_time(&conn, &stylist, &date(MONDAY), minutes("10:00"), 30);
        assert!(matches!(result, Err(SchedulingError::NotWorking { .. })));
    }

    #[test]
    fn test_free_slots_huge_buffer_is_empty() {
        assert!(free_slots((minutes("09:00"), minutes("18:00")), 30, u32::MAX, &[]).is_empty());
        assert!(free_slots((minutes("09:00"), minutes("18:00")), u32::MAX - 3, 5, &[]).is_empty());
    }

    #[test]
    fn test_huge_duration_is_rejected_not_wrapped() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        fixtures::set_day(&conn, &ids.stylist_id, 1, "09:00", "18:00", true);
        fixtures::insert_booking(&conn, &ids, MONDAY, "10:00", "10:30", BookingStatus::Confirmed);
        let stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();

        let result = validate_booking_time(&conn, &stylist, &date(MONDAY), minutes("10:00"), u32::MAX - 10);
        assert!(matches!(result, Err(SchedulingError::TooLong { .. })));

        let existing = queries::get_occupying_bookings(&conn, &ids.stylist_id, MONDAY).unwrap();
        let result = check_conflict(minutes("09:00"), 30, u32::MAX, &existing);
        assert!(matches!(result, Err(SchedulingError::TooLong { .. })));
    }

    #[test]
    fn test_huge_stored_buffer_does_not_overflow() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        fixtures::set_day(&conn, &ids.stylist_id, 1, "09:00", "18:00", true);
        fixtures::insert_booking(&conn, &ids, MONDAY, "10:00", "10:30", BookingStatus::Confirmed);
        let mut stylist = queries::get_stylist(&conn, &ids.stylist_id).unwrap().unwrap();
        stylist.buffer_minutes = Some(i64::from(u32::MAX));

        assert!(available_slots(&conn, &stylist, &date(MONDAY), 30).unwrap().is_empty());
        let result = validate_booking_time(&conn, &stylist, &date(MONDAY), minutes("11:00"), 30);
        assert!(matches!(result, Err(SchedulingError::TooLong { .. })));
    }
}
