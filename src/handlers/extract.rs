use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, Salon};
use crate::services::auth;
use crate::state::AppState;

/// The caller, as identified by a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
    pub salon_id: Option<String>,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

        let claims = auth::verify_token(token, &state.config.jwt_secret).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AppError::Unauthorized
        })?;

        // Tokens outlive account changes; the stored row decides.
        let user = {
            let db = state.db()?;
            queries::get_user_by_id(&db, &claims.sub)?
        };
        match user {
            Some(user) if user.is_active => Ok(AuthUser {
                id: user.id,
                role: user.role,
                salon_id: user.salon_id,
            }),
            Some(_) => {
                tracing::debug!(user_id = %claims.sub, "token for deactivated account");
                Err(AppError::Unauthorized)
            }
            None => Err(AppError::Unauthorized),
        }
    }
}

impl AuthUser {
    pub fn require(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "role {} may not perform this action",
                self.role.as_str()
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require(&[Role::Admin, Role::SuperAdmin])
    }

    /// Owner of the salon or an admin.
    pub fn manages(&self, salon: &Salon) -> bool {
        self.role.is_admin() || (self.role == Role::SalonOwner && salon.owner_id == self.id)
    }

    /// Owner, a cashier of the salon, or an admin.
    pub fn works_at(&self, salon: &Salon) -> bool {
        self.manages(salon)
            || (self.role == Role::Caissier && self.salon_id.as_deref() == Some(salon.id.as_str()))
    }

    pub fn ensure_manages(&self, salon: &Salon) -> Result<(), AppError> {
        if self.manages(salon) {
            Ok(())
        } else {
            Err(AppError::forbidden("you do not manage this salon"))
        }
    }

    pub fn ensure_works_at(&self, salon: &Salon) -> Result<(), AppError> {
        if self.works_at(salon) {
            Ok(())
        } else {
            Err(AppError::forbidden("you do not work at this salon"))
        }
    }
}

pub fn load_salon(conn: &Connection, id: &str) -> Result<Salon, AppError> {
    queries::get_salon(conn, id)?.ok_or_else(|| AppError::not_found("salon"))
}
