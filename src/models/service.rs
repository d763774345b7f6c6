use serde::{Deserialize, Serialize};

/// A bookable salon service. Prices are stored in cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub salon_id: String,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub price_cents: i64,
    pub is_active: bool,
}
