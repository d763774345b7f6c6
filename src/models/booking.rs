use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A rendezvous: one client, one stylist, one or more services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub client_id: String,
    pub salon_id: String,
    pub stylist_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: BookingStatus,
    pub total_price_cents: i64,
    pub total_duration_minutes: i64,
    pub deposit_required: bool,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
    pub paid_amount_cents: Option<i64>,
    pub service_ids: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn starts_at(&self) -> anyhow::Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(
            &format!("{} {}", self.date, self.start_time),
            "%Y-%m-%d %H:%M",
        )
        .map_err(|e| anyhow::anyhow!("invalid booking start {} {}: {e}", self.date, self.start_time))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
    Late,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::NoShow => "NO_SHOW",
            BookingStatus::Late => "LATE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            "COMPLETED" => Some(BookingStatus::Completed),
            "NO_SHOW" => Some(BookingStatus::NoShow),
            "LATE" => Some(BookingStatus::Late),
            _ => None,
        }
    }

    /// Only pending and confirmed bookings hold their slot.
    pub fn occupies_calendar(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Pending, NoShow)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (Confirmed, Late)
                | (Late, Completed)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mobile,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Mobile => "MOBILE",
        }
    }
}
