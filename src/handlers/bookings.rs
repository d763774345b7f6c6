use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Local, Utc};
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::extract::{load_salon, AuthUser};
use crate::models::availability::{parse_date, parse_time};
use crate::models::{Booking, BookingStatus, Role};
use crate::services::reservations::{self, NewBooking};
use crate::services::calendar;
use crate::state::AppState;

fn load_booking(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    queries::get_booking(conn, id)?.ok_or_else(|| AppError::not_found("rendezvous"))
}

/// The booking's client, or anyone working at its salon.
fn ensure_can_view(conn: &Connection, auth_user: &AuthUser, booking: &Booking) -> Result<(), AppError> {
    if booking.client_id == auth_user.id {
        return Ok(());
    }
    let salon = load_salon(conn, &booking.salon_id)?;
    auth_user.ensure_works_at(&salon)
}

// POST /api/rendezvous
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub salon_id: String,
    pub stylist_id: String,
    pub service_ids: Vec<String>,
    pub date: String,
    pub start_time: String,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    auth_user.require(&[Role::Client])?;

    let date = parse_date(&body.date).map_err(|e| AppError::validation(e.to_string()))?;
    let start = parse_time(&body.start_time).map_err(|e| AppError::validation(e.to_string()))?;

    let now = Local::now().naive_local();
    let starts_at = date.and_hms_opt(start / 60, start % 60, 0);
    if starts_at.map_or(true, |s| s <= now) {
        return Err(AppError::validation("cannot book a time in the past"));
    }

    let db = state.db()?;
    let salon = load_salon(&db, &body.salon_id)?;
    let stylist = queries::get_stylist(&db, &body.stylist_id)?
        .ok_or_else(|| AppError::not_found("stylist"))?;

    let mut services = Vec::with_capacity(body.service_ids.len());
    for service_id in &body.service_ids {
        let service = queries::get_service(&db, service_id)?
            .ok_or_else(|| AppError::not_found(format!("service {service_id}")))?;
        services.push(service);
    }

    let booking = reservations::create_booking(
        &db,
        NewBooking {
            client_id: auth_user.id,
            salon,
            stylist,
            services,
            date,
            start,
            notes: body.notes.filter(|n| !n.trim().is_empty()),
        },
    )?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/rendezvous/mine
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Booking>>, AppError> {
    auth_user.require(&[Role::Client])?;
    let db = state.db()?;
    Ok(Json(queries::list_bookings_for_client(&db, &auth_user.id)?))
}

// GET /api/rendezvous/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let db = state.db()?;
    let booking = load_booking(&db, &id)?;
    ensure_can_view(&db, &auth_user, &booking)?;
    Ok(Json(booking))
}

// POST /api/rendezvous/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let db = state.db()?;
    let booking = load_booking(&db, &id)?;
    ensure_can_view(&db, &auth_user, &booking)?;

    let by_client = booking.client_id == auth_user.id;
    let cancelled = reservations::cancel(&db, &booking, by_client, Utc::now().naive_utc())?;
    Ok(Json(cancelled))
}

// PATCH /api/rendezvous/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: BookingStatus,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let db = state.db()?;
    let booking = load_booking(&db, &id)?;
    let salon = load_salon(&db, &booking.salon_id)?;
    auth_user.ensure_works_at(&salon)?;

    let updated = match body.status {
        BookingStatus::Cancelled => {
            reservations::cancel(&db, &booking, false, Utc::now().naive_utc())?
        }
        next => reservations::change_status(&db, &booking, next)?,
    };
    Ok(Json(updated))
}

// GET /api/rendezvous/:id/calendar.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let db = state.db()?;
    let booking = load_booking(&db, &id)?;
    ensure_can_view(&db, &auth_user, &booking)?;

    let salon = load_salon(&db, &booking.salon_id)?;
    let stylist_name = queries::get_stylist(&db, &booking.stylist_id)?
        .map(|s| s.name)
        .unwrap_or_default();
    let ics = calendar::generate_ics(&booking, &salon.name, &stylist_name);

    let disposition = format!("attachment; filename=\"rendezvous-{}.ics\"", booking.id);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        ics,
    )
        .into_response())
}

// GET /api/salons/:id/rendezvous?date=&status=
#[derive(Deserialize)]
pub struct SalonBookingsQuery {
    pub date: Option<String>,
    pub status: Option<BookingStatus>,
}

pub async fn salon_bookings(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(salon_id): Path<String>,
    Query(query): Query<SalonBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    if let Some(date) = query.date.as_deref() {
        parse_date(date).map_err(|e| AppError::validation(e.to_string()))?;
    }

    let db = state.db()?;
    let salon = load_salon(&db, &salon_id)?;
    auth_user.ensure_works_at(&salon)?;

    let bookings = queries::list_bookings_for_salon(&db, &salon.id, query.date.as_deref(), query.status)?;
    Ok(Json(bookings))
}
