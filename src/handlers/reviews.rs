use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::extract::{load_salon, AuthUser};
use crate::models::{Favorite, Review, Role};
use crate::services::scoring;
use crate::state::AppState;

// GET /api/salons/:id/reviews
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(salon_id): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    let db = state.db()?;
    let salon = load_salon(&db, &salon_id)?;
    Ok(Json(queries::list_reviews(&db, &salon.id)?))
}

// POST /api/salons/:id/reviews
#[derive(Deserialize)]
pub struct ReviewRequest {
    pub rating: i64,
    pub comment: Option<String>,
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(salon_id): Path<String>,
    Json(body): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    auth_user.require(&[Role::Client])?;
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::validation("rating must be between 1 and 5"));
    }

    let db = state.db()?;
    let salon = load_salon(&db, &salon_id)?;
    if !queries::has_completed_booking_at_salon(&db, &auth_user.id, &salon.id)? {
        return Err(AppError::forbidden(
            "only clients with a completed rendezvous may review this salon",
        ));
    }
    if queries::has_reviewed(&db, &auth_user.id, &salon.id)? {
        return Err(AppError::conflict("you have already reviewed this salon"));
    }

    let review = Review {
        id: uuid::Uuid::new_v4().to_string(),
        salon_id: salon.id,
        client_id: auth_user.id,
        client_name: None,
        rating: body.rating,
        comment: body.comment.filter(|c| !c.trim().is_empty()),
        created_at: Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    let tx = db.unchecked_transaction()?;
    queries::create_review(&tx, &review)?;
    if let Some(event) = scoring::event_for_review(review.rating) {
        scoring::record_event(&tx, &review.client_id, event, None)?;
    }
    tx.commit()?;

    tracing::info!(salon_id = %review.salon_id, rating = review.rating, "review posted");
    Ok((StatusCode::CREATED, Json(review)))
}

// GET /api/favorites
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Favorite>>, AppError> {
    auth_user.require(&[Role::Client])?;
    let db = state.db()?;
    Ok(Json(queries::list_favorites(&db, &auth_user.id)?))
}

// POST /api/favorites/:salon_id
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(salon_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth_user.require(&[Role::Client])?;

    let db = state.db()?;
    let salon = load_salon(&db, &salon_id)?;
    if !salon.is_active {
        return Err(AppError::not_found("salon"));
    }
    queries::add_favorite(&db, &auth_user.id, &salon.id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

// DELETE /api/favorites/:salon_id
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(salon_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth_user.require(&[Role::Client])?;

    let db = state.db()?;
    let removed = queries::remove_favorite(&db, &auth_user.id, &salon_id)?;
    Ok(Json(serde_json::json!({"ok": true, "removed": removed})))
}
