use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salon {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalonImage {
    pub id: String,
    pub salon_id: String,
    pub url: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalonDetail {
    #[serde(flatten)]
    pub salon: Salon,
    pub images: Vec<SalonImage>,
}
