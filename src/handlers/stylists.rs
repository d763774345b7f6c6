use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Local, Timelike};
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::extract::{load_salon, AuthUser};
use crate::models::availability::{parse_date, parse_time};
use crate::models::{Availability, Stylist};
use crate::services::scheduling::{self, Slot, DEFAULT_DURATION_MINUTES, MINUTES_PER_DAY};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StylistRequest {
    pub name: String,
    pub specialty: Option<String>,
    pub buffer_minutes: Option<i64>,
}

impl StylistRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name is required"));
        }
        if matches!(self.buffer_minutes, Some(b) if b < 0 || b > i64::from(MINUTES_PER_DAY)) {
            return Err(AppError::validation(format!(
                "buffer_minutes must be between 0 and {MINUTES_PER_DAY}"
            )));
        }
        Ok(())
    }
}

fn load_stylist(conn: &Connection, id: &str) -> Result<Stylist, AppError> {
    queries::get_stylist(conn, id)?.ok_or_else(|| AppError::not_found("stylist"))
}

// GET /api/salons/:id/stylists
pub async fn list_stylists(
    State(state): State<Arc<AppState>>,
    Path(salon_id): Path<String>,
) -> Result<Json<Vec<Stylist>>, AppError> {
    let db = state.db()?;
    let salon = load_salon(&db, &salon_id)?;
    Ok(Json(queries::list_stylists(&db, &salon.id, true)?))
}

// POST /api/salons/:id/stylists
pub async fn create_stylist(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(salon_id): Path<String>,
    Json(body): Json<StylistRequest>,
) -> Result<(StatusCode, Json<Stylist>), AppError> {
    body.validate()?;

    let db = state.db()?;
    let salon = load_salon(&db, &salon_id)?;
    auth_user.ensure_manages(&salon)?;

    let stylist = Stylist {
        id: uuid::Uuid::new_v4().to_string(),
        salon_id: salon.id,
        name: body.name.trim().to_string(),
        specialty: body.specialty,
        buffer_minutes: body.buffer_minutes,
        is_active: true,
    };
    queries::create_stylist(&db, &stylist)?;
    tracing::info!(stylist_id = %stylist.id, salon_id = %stylist.salon_id, "stylist created");

    Ok((StatusCode::CREATED, Json(stylist)))
}

// PUT /api/stylists/:id
pub async fn update_stylist(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<StylistRequest>,
) -> Result<Json<Stylist>, AppError> {
    body.validate()?;

    let db = state.db()?;
    let mut stylist = load_stylist(&db, &id)?;
    let salon = load_salon(&db, &stylist.salon_id)?;
    auth_user.ensure_manages(&salon)?;

    stylist.name = body.name.trim().to_string();
    stylist.specialty = body.specialty;
    stylist.buffer_minutes = body.buffer_minutes;
    queries::update_stylist(&db, &stylist)?;

    Ok(Json(stylist))
}

// DELETE /api/stylists/:id
pub async fn deactivate_stylist(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Stylist>, AppError> {
    let db = state.db()?;
    let mut stylist = load_stylist(&db, &id)?;
    let salon = load_salon(&db, &stylist.salon_id)?;
    auth_user.ensure_manages(&salon)?;

    stylist.is_active = false;
    queries::update_stylist(&db, &stylist)?;
    tracing::info!(stylist_id = %stylist.id, "stylist deactivated");

    Ok(Json(stylist))
}

// GET /api/stylists/:id/availability
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Availability>>, AppError> {
    let db = state.db()?;
    let stylist = load_stylist(&db, &id)?;
    Ok(Json(queries::list_availability(&db, &stylist.id)?))
}

// PUT /api/stylists/:id/availability
#[derive(Deserialize)]
pub struct DayRequest {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

pub async fn put_availability(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<Vec<DayRequest>>,
) -> Result<Json<Vec<Availability>>, AppError> {
    let db = state.db()?;
    let stylist = load_stylist(&db, &id)?;
    let salon = load_salon(&db, &stylist.salon_id)?;
    auth_user.ensure_manages(&salon)?;

    let mut seen = HashSet::new();
    let mut days = Vec::with_capacity(body.len());
    for day in body {
        let availability = Availability {
            stylist_id: stylist.id.clone(),
            day_of_week: day.day_of_week,
            start_time: day.start_time,
            end_time: day.end_time,
            is_available: day.is_available,
        };
        availability
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        if !seen.insert(availability.day_of_week) {
            return Err(AppError::validation(format!(
                "day_of_week {} listed twice",
                availability.day_of_week
            )));
        }
        days.push(availability);
    }

    queries::replace_availability(&db, &stylist.id, &days)?;
    tracing::info!(stylist_id = %stylist.id, days = days.len(), "availability replaced");

    Ok(Json(queries::list_availability(&db, &stylist.id)?))
}

// GET /api/stylists/:id/slots?date=YYYY-MM-DD&service_id=
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
    pub service_id: Option<String>,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let date = parse_date(&query.date).map_err(|e| AppError::validation(e.to_string()))?;

    let db = state.db()?;
    let stylist = load_stylist(&db, &id)?;
    let salon = load_salon(&db, &stylist.salon_id)?;
    if !salon.is_active || !stylist.is_active {
        return Ok(Json(vec![]));
    }

    let duration = match query.service_id.as_deref() {
        Some(service_id) => {
            let service = queries::get_service(&db, service_id)?
                .filter(|s| s.salon_id == salon.id && s.is_active)
                .ok_or_else(|| AppError::not_found("service"))?;
            u32::try_from(service.duration_minutes)
                .map_err(|_| AppError::validation("invalid service duration"))?
        }
        None => DEFAULT_DURATION_MINUTES,
    };

    let now = Local::now().naive_local();
    let today = now.date();
    if date < today {
        return Ok(Json(vec![]));
    }

    let mut slots = scheduling::available_slots(&db, &stylist, &date, duration)?;
    if date == today {
        let current = now.hour() * 60 + now.minute();
        slots.retain(|slot| parse_time(&slot.time).map(|t| t > current).unwrap_or(false));
    }

    Ok(Json(slots))
}
