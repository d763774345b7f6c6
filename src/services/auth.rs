use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, User};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salon_id: Option<String>,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id.clone(),
        role: user.role,
        salon_id: user.salon_id.clone(),
        exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
    pub phone: Option<String>,
    pub role: Role,
    pub salon_id: Option<String>,
}

/// Validates and stores a new user. Every account type goes through here:
/// self-registration, cashiers, admins and the bootstrap super admin.
pub fn create_account(conn: &Connection, account: NewAccount<'_>) -> Result<User, AppError> {
    let email = account.email.trim().to_lowercase();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(AppError::validation(format!("invalid email: {email}")));
    }
    if account.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let full_name = account.full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::validation("full_name is required"));
    }
    if queries::get_user_by_email(conn, &email)?.is_some() {
        return Err(AppError::conflict("email is already registered"));
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        password_hash: hash_password(account.password)?,
        full_name: full_name.to_string(),
        phone: account.phone.filter(|p| !p.trim().is_empty()),
        role: account.role,
        salon_id: account.salon_id,
        is_active: true,
        created_at: Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    queries::create_user(conn, &user)?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "account created");
    Ok(user)
}

/// Creates the configured super admin on first start. Returns whether an
/// account was created; an existing account with that email is left alone.
pub fn ensure_super_admin(conn: &Connection, email: &str, password: &str) -> Result<bool, AppError> {
    if queries::get_user_by_email(conn, email.trim())?.is_some() {
        return Ok(false);
    }
    create_account(
        conn,
        NewAccount {
            email,
            password,
            full_name: "Super Admin",
            phone: None,
            role: Role::SuperAdmin,
            salon_id: None,
        },
    )?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: "u-1".to_string(),
            email: "nadia@example.com".to_string(),
            password_hash: String::new(),
            full_name: "Nadia".to_string(),
            phone: None,
            role,
            salon_id: Some("salon-1".to_string()),
            is_active: true,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_carries_role_and_salon() {
        let token = issue_token(&user(Role::Caissier), "secret", 1).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, Role::Caissier);
        assert_eq!(claims.salon_id.as_deref(), Some("salon-1"));
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = issue_token(&user(Role::Client), "secret", 1).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn test_create_account_normalizes_and_rejects_duplicates() {
        let conn = crate::db::fixtures::setup_db();
        let account = || NewAccount {
            email: "  Nadia@Example.com ",
            password: "long-enough",
            full_name: "Nadia",
            phone: None,
            role: Role::Client,
            salon_id: None,
        };

        let user = create_account(&conn, account()).unwrap();
        assert_eq!(user.email, "nadia@example.com");
        assert!(verify_password("long-enough", &user.password_hash));

        let err = create_account(&conn, account()).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_create_account_rejects_short_password() {
        let conn = crate::db::fixtures::setup_db();
        let err = create_account(
            &conn,
            NewAccount {
                email: "a@b.c",
                password: "short",
                full_name: "A",
                phone: None,
                role: Role::Client,
                salon_id: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(&user(Role::Client), "secret", -2).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn test_super_admin_bootstrap_runs_once() {
        let conn = crate::db::fixtures::setup_db();
        assert!(ensure_super_admin(&conn, "root@salonbook.test", "root-password").unwrap());
        assert!(!ensure_super_admin(&conn, "ROOT@salonbook.test", "root-password").unwrap());

        let admin = queries::get_user_by_email(&conn, "root@salonbook.test")
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::SuperAdmin);
    }
}
