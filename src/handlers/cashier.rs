use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::extract::{load_salon, AuthUser};
use crate::models::{Booking, PaymentMethod, Role, User};
use crate::services::auth::{self, NewAccount};
use crate::services::reservations;
use crate::state::AppState;

// POST /api/salons/:id/cashiers
#[derive(Deserialize)]
pub struct CashierRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

pub async fn create_cashier(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(salon_id): Path<String>,
    Json(body): Json<CashierRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let db = state.db()?;
    let salon = load_salon(&db, &salon_id)?;
    auth_user.ensure_manages(&salon)?;

    let user = auth::create_account(
        &db,
        NewAccount {
            email: &body.email,
            password: &body.password,
            full_name: &body.full_name,
            phone: body.phone,
            role: Role::Caissier,
            salon_id: Some(salon.id),
        },
    )?;
    Ok((StatusCode::CREATED, Json(user)))
}

// GET /api/salons/:id/cashiers
pub async fn list_cashiers(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(salon_id): Path<String>,
) -> Result<Json<Vec<User>>, AppError> {
    let db = state.db()?;
    let salon = load_salon(&db, &salon_id)?;
    auth_user.ensure_manages(&salon)?;
    Ok(Json(queries::list_cashiers(&db, &salon.id)?))
}

// GET /api/cashier/today
pub async fn today(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Booking>>, AppError> {
    auth_user.require(&[Role::Caissier])?;
    let salon_id = auth_user
        .salon_id
        .as_deref()
        .ok_or_else(|| AppError::forbidden("cashier account is not bound to a salon"))?;

    let date = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let db = state.db()?;
    Ok(Json(queries::list_bookings_for_salon(&db, salon_id, Some(date.as_str()), None)?))
}

// POST /api/cashier/rendezvous/:id/checkout
#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    pub amount_cents: Option<i64>,
}

pub async fn checkout(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<Booking>, AppError> {
    let db = state.db()?;
    let booking = queries::get_booking(&db, &id)?.ok_or_else(|| AppError::not_found("rendezvous"))?;
    let salon = load_salon(&db, &booking.salon_id)?;
    auth_user.ensure_works_at(&salon)?;

    let completed = reservations::checkout(&db, &booking, body.payment_method, body.amount_cents)?;
    Ok(Json(completed))
}
