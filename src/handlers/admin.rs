use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db::queries::{self, AdminStats};
use crate::errors::AppError;
use crate::handlers::extract::AuthUser;
use crate::models::{Role, Salon, User};
use crate::services::auth::{self, NewAccount};
use crate::state::AppState;

// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<AdminStats>, AppError> {
    auth_user.require_admin()?;
    let db = state.db()?;
    Ok(Json(queries::get_admin_stats(&db)?))
}

// GET /api/admin/users
#[derive(Deserialize)]
pub struct UsersQuery {
    pub role: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    auth_user.require_admin()?;

    let role = match query.role.as_deref() {
        Some(r) => Some(Role::parse(r).ok_or_else(|| AppError::validation(format!("unknown role: {r}")))?),
        None => None,
    };
    let limit = query.limit.unwrap_or(100).clamp(1, 500);

    let db = state.db()?;
    Ok(Json(queries::list_users(&db, role, limit)?))
}

// POST /api/admin/users/:id/activate
pub async fn activate_user(
    state: State<Arc<AppState>>,
    auth_user: AuthUser,
    id: Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_user_active(state, auth_user, id, true).await
}

// POST /api/admin/users/:id/deactivate
pub async fn deactivate_user(
    state: State<Arc<AppState>>,
    auth_user: AuthUser,
    id: Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_user_active(state, auth_user, id, false).await
}

async fn set_user_active(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    active: bool,
) -> Result<Json<serde_json::Value>, AppError> {
    auth_user.require_admin()?;
    if id == auth_user.id {
        return Err(AppError::validation("you cannot change your own account status"));
    }

    let db = state.db()?;
    let target = queries::get_user_by_id(&db, &id)?.ok_or_else(|| AppError::not_found("user"))?;
    if target.role == Role::SuperAdmin && auth_user.role != Role::SuperAdmin {
        return Err(AppError::forbidden("only a super admin may change a super admin"));
    }
    queries::set_user_active(&db, &id, active)?;
    tracing::info!(user_id = %id, active, admin_id = %auth_user.id, "user status changed");

    Ok(Json(serde_json::json!({"ok": true, "id": id, "is_active": active})))
}

// GET /api/admin/salons
pub async fn list_salons(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Salon>>, AppError> {
    auth_user.require_admin()?;
    let db = state.db()?;
    Ok(Json(queries::list_all_salons(&db)?))
}

// POST /api/admin/salons/:id/activate
pub async fn activate_salon(
    state: State<Arc<AppState>>,
    auth_user: AuthUser,
    id: Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_salon_active(state, auth_user, id, true).await
}

// POST /api/admin/salons/:id/deactivate
pub async fn deactivate_salon(
    state: State<Arc<AppState>>,
    auth_user: AuthUser,
    id: Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_salon_active(state, auth_user, id, false).await
}

async fn set_salon_active(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    active: bool,
) -> Result<Json<serde_json::Value>, AppError> {
    auth_user.require_admin()?;

    let db = state.db()?;
    if !queries::set_salon_active(&db, &id, active)? {
        return Err(AppError::not_found("salon"));
    }
    tracing::info!(salon_id = %id, active, admin_id = %auth_user.id, "salon status changed");

    Ok(Json(serde_json::json!({"ok": true, "id": id, "is_active": active})))
}

// POST /api/admin/admins
#[derive(Deserialize)]
pub struct AdminRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

pub async fn create_admin(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Json(body): Json<AdminRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    auth_user.require(&[Role::SuperAdmin])?;

    let db = state.db()?;
    let user = auth::create_account(
        &db,
        NewAccount {
            email: &body.email,
            password: &body.password,
            full_name: &body.full_name,
            phone: None,
            role: Role::Admin,
            salon_id: None,
        },
    )?;
    Ok((StatusCode::CREATED, Json(user)))
}
