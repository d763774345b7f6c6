use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::extract::AuthUser;
use crate::models::{ClientScore, Role, ScoreEvent, ScoreEventRecord};
use crate::services::scoring;
use crate::state::AppState;

fn ensure_client_exists(conn: &rusqlite::Connection, client_id: &str) -> Result<(), AppError> {
    match queries::get_user_by_id(conn, client_id)? {
        Some(user) if user.role == Role::Client => Ok(()),
        _ => Err(AppError::not_found("client")),
    }
}

// GET /api/scores/me
pub async fn my_score(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<ClientScore>, AppError> {
    auth_user.require(&[Role::Client])?;
    let db = state.db()?;
    Ok(Json(queries::get_client_score(&db, &auth_user.id)?))
}

// GET /api/clients/:id/score
pub async fn client_score(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(client_id): Path<String>,
) -> Result<Json<ClientScore>, AppError> {
    auth_user.require(&[Role::SalonOwner, Role::Caissier, Role::Admin, Role::SuperAdmin])?;
    let db = state.db()?;
    ensure_client_exists(&db, &client_id)?;
    Ok(Json(queries::get_client_score(&db, &client_id)?))
}

// GET /api/clients/:id/score/events
pub async fn score_events(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(client_id): Path<String>,
) -> Result<Json<Vec<ScoreEventRecord>>, AppError> {
    auth_user.require_admin()?;
    let db = state.db()?;
    ensure_client_exists(&db, &client_id)?;
    Ok(Json(queries::list_score_events(&db, &client_id)?))
}

// POST /api/clients/:id/score/events
#[derive(Deserialize)]
pub struct ManualEventRequest {
    pub event: ScoreEvent,
    pub rendezvous_id: Option<String>,
}

pub async fn record_manual_event(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(client_id): Path<String>,
    Json(body): Json<ManualEventRequest>,
) -> Result<Json<ClientScore>, AppError> {
    auth_user.require_admin()?;

    let db = state.db()?;
    ensure_client_exists(&db, &client_id)?;
    if let Some(rendezvous_id) = body.rendezvous_id.as_deref() {
        match queries::get_booking(&db, rendezvous_id)? {
            Some(booking) if booking.client_id == client_id => {}
            _ => return Err(AppError::not_found("rendezvous")),
        }
    }

    let tx = db.unchecked_transaction()?;
    let score = scoring::record_event(&tx, &client_id, body.event, body.rendezvous_id.as_deref())?;
    tx.commit()?;

    tracing::info!(client_id = %client_id, admin_id = %auth_user.id, event = body.event.as_str(), "manual score event");
    Ok(Json(score))
}
