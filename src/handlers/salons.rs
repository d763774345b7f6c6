use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::extract::{load_salon, AuthUser};
use crate::models::{Role, Salon, SalonDetail, SalonImage};
use crate::state::AppState;

// GET /api/salons
#[derive(Deserialize)]
pub struct SalonsQuery {
    pub city: Option<String>,
    pub q: Option<String>,
}

pub async fn list_salons(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SalonsQuery>,
) -> Result<Json<Vec<Salon>>, AppError> {
    let city = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let db = state.db()?;
    let salons = queries::list_active_salons(&db, city, search)?;
    Ok(Json(salons))
}

// GET /api/salons/:id
pub async fn get_salon(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SalonDetail>, AppError> {
    let db = state.db()?;
    let salon = load_salon(&db, &id)?;
    if !salon.is_active {
        return Err(AppError::not_found("salon"));
    }
    let images = queries::list_salon_images(&db, &salon.id)?;
    Ok(Json(SalonDetail { salon, images }))
}

// POST /api/salons
#[derive(Deserialize)]
pub struct SalonRequest {
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub description: Option<String>,
}

impl SalonRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name is required"));
        }
        if self.address.trim().is_empty() {
            return Err(AppError::validation("address is required"));
        }
        if self.city.trim().is_empty() {
            return Err(AppError::validation("city is required"));
        }
        Ok(())
    }
}

pub async fn create_salon(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Json(body): Json<SalonRequest>,
) -> Result<(StatusCode, Json<Salon>), AppError> {
    auth_user.require(&[Role::SalonOwner])?;
    body.validate()?;

    let db = state.db()?;
    let id = uuid::Uuid::new_v4().to_string();
    queries::create_salon(
        &db,
        &Salon {
            id: id.clone(),
            owner_id: auth_user.id.clone(),
            name: body.name.trim().to_string(),
            address: body.address.trim().to_string(),
            city: body.city.trim().to_string(),
            phone: body.phone,
            description: body.description,
            is_active: true,
            average_rating: None,
            review_count: 0,
            created_at: String::new(),
            updated_at: String::new(),
        },
    )?;
    tracing::info!(salon_id = %id, owner_id = %auth_user.id, "salon created");

    let salon = load_salon(&db, &id)?;
    Ok((StatusCode::CREATED, Json(salon)))
}

// PUT /api/salons/:id
pub async fn update_salon(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<SalonRequest>,
) -> Result<Json<Salon>, AppError> {
    body.validate()?;

    let db = state.db()?;
    let mut salon = load_salon(&db, &id)?;
    auth_user.ensure_manages(&salon)?;

    salon.name = body.name.trim().to_string();
    salon.address = body.address.trim().to_string();
    salon.city = body.city.trim().to_string();
    salon.phone = body.phone;
    salon.description = body.description;
    queries::update_salon(&db, &salon)?;

    Ok(Json(load_salon(&db, &id)?))
}

// GET /api/owner/salons
pub async fn my_salons(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Salon>>, AppError> {
    auth_user.require(&[Role::SalonOwner])?;
    let db = state.db()?;
    Ok(Json(queries::list_salons_by_owner(&db, &auth_user.id)?))
}

// POST /api/salons/:id/images
#[derive(Deserialize)]
pub struct ImageRequest {
    pub url: String,
}

pub async fn add_image(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ImageRequest>,
) -> Result<(StatusCode, Json<SalonImage>), AppError> {
    let url = body.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::validation("image url must be http(s)"));
    }

    let db = state.db()?;
    let salon = load_salon(&db, &id)?;
    auth_user.ensure_manages(&salon)?;

    let image = SalonImage {
        id: uuid::Uuid::new_v4().to_string(),
        salon_id: salon.id,
        url: url.to_string(),
        position: queries::next_image_position(&db, &id)?,
    };
    queries::add_salon_image(&db, &image)?;
    Ok((StatusCode::CREATED, Json(image)))
}

// DELETE /api/salons/:id/images/:image_id
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path((id, image_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db()?;
    let salon = load_salon(&db, &id)?;
    auth_user.ensure_manages(&salon)?;

    if queries::delete_salon_image(&db, &salon.id, &image_id)? {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::not_found("image"))
    }
}
