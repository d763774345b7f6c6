use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::extract::{load_salon, AuthUser};
use crate::models::Service;
use crate::services::scheduling::MINUTES_PER_DAY;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub price_cents: i64,
}

impl ServiceRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name is required"));
        }
        if self.duration_minutes <= 0 || self.duration_minutes > i64::from(MINUTES_PER_DAY) {
            return Err(AppError::validation(format!(
                "duration_minutes must be between 1 and {MINUTES_PER_DAY}"
            )));
        }
        if self.price_cents < 0 {
            return Err(AppError::validation("price_cents must not be negative"));
        }
        Ok(())
    }
}

fn load_service(conn: &Connection, id: &str) -> Result<Service, AppError> {
    queries::get_service(conn, id)?.ok_or_else(|| AppError::not_found("service"))
}

// GET /api/salons/:id/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Path(salon_id): Path<String>,
) -> Result<Json<Vec<Service>>, AppError> {
    let db = state.db()?;
    let salon = load_salon(&db, &salon_id)?;
    Ok(Json(queries::list_services(&db, &salon.id, true)?))
}

// POST /api/salons/:id/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(salon_id): Path<String>,
    Json(body): Json<ServiceRequest>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    body.validate()?;

    let db = state.db()?;
    let salon = load_salon(&db, &salon_id)?;
    auth_user.ensure_manages(&salon)?;

    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        salon_id: salon.id,
        name: body.name.trim().to_string(),
        description: body.description,
        duration_minutes: body.duration_minutes,
        price_cents: body.price_cents,
        is_active: true,
    };
    queries::create_service(&db, &service)?;
    tracing::info!(service_id = %service.id, salon_id = %service.salon_id, "service created");

    Ok((StatusCode::CREATED, Json(service)))
}

// PUT /api/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ServiceRequest>,
) -> Result<Json<Service>, AppError> {
    body.validate()?;

    let db = state.db()?;
    let mut service = load_service(&db, &id)?;
    let salon = load_salon(&db, &service.salon_id)?;
    auth_user.ensure_manages(&salon)?;

    service.name = body.name.trim().to_string();
    service.description = body.description;
    service.duration_minutes = body.duration_minutes;
    service.price_cents = body.price_cents;
    queries::update_service(&db, &service)?;

    Ok(Json(service))
}

// DELETE /api/services/:id
pub async fn deactivate_service(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Service>, AppError> {
    let db = state.db()?;
    let mut service = load_service(&db, &id)?;
    let salon = load_salon(&db, &service.salon_id)?;
    auth_user.ensure_manages(&salon)?;

    service.is_active = false;
    queries::update_service(&db, &service)?;
    tracing::info!(service_id = %service.id, "service deactivated");

    Ok(Json(service))
}
