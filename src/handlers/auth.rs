use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::extract::AuthUser;
use crate::models::{Role, User};
use crate::services::auth::{self, NewAccount};
use crate::state::AppState;

#[derive(Serialize)]
pub struct AuthResponse {
    token: String,
    user: User,
}

// POST /api/auth/register
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let role = body.role.unwrap_or(Role::Client);
    if !matches!(role, Role::Client | Role::SalonOwner) {
        return Err(AppError::forbidden(format!(
            "cannot self-register as {}",
            role.as_str()
        )));
    }

    let user = {
        let db = state.db()?;
        auth::create_account(
            &db,
            NewAccount {
                email: &body.email,
                password: &body.password,
                full_name: &body.full_name,
                phone: body.phone,
                role,
                salon_id: None,
            },
        )?
    };

    let token = auth::issue_token(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;
    Ok(Json(AuthResponse { token, user }))
}

// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = {
        let db = state.db()?;
        queries::get_user_by_email(&db, body.email.trim())?
    };

    let user = match user {
        Some(u) if auth::verify_password(&body.password, &u.password_hash) => u,
        _ => {
            tracing::info!(email = %body.email.trim(), "failed login attempt");
            return Err(AppError::Unauthorized);
        }
    };
    if !user.is_active {
        return Err(AppError::forbidden("account is deactivated"));
    }

    let token = auth::issue_token(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;
    Ok(Json(AuthResponse { token, user }))
}

// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<User>, AppError> {
    let db = state.db()?;
    let user = queries::get_user_by_id(&db, &auth_user.id)?.ok_or_else(|| AppError::not_found("user"))?;
    Ok(Json(user))
}
