use serde::{Deserialize, Serialize};

pub const DEFAULT_BUFFER_MINUTES: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stylist {
    pub id: String,
    pub salon_id: String,
    pub name: String,
    pub specialty: Option<String>,
    pub buffer_minutes: Option<i64>,
    pub is_active: bool,
}

impl Stylist {
    /// Idle minutes enforced after each of this stylist's bookings.
    pub fn buffer(&self) -> u32 {
        self.buffer_minutes
            .and_then(|b| u32::try_from(b).ok())
            .unwrap_or(DEFAULT_BUFFER_MINUTES)
    }
}
