use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub salon_id: String,
    pub client_id: String,
    pub client_name: Option<String>,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub salon_id: String,
    pub salon_name: String,
    pub city: String,
    pub created_at: String,
}
