use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::services::auth;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    if config.jwt_secret == "changeme" {
        tracing::warn!("JWT_SECRET is not set, using an insecure default");
    }

    let conn = db::init_db(&config.database_url)?;

    match (&config.super_admin_email, &config.super_admin_password) {
        (Some(email), Some(password)) => {
            if auth::ensure_super_admin(&conn, email, password)? {
                tracing::info!(email = %email, "super admin account created");
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            tracing::warn!("SUPER_ADMIN_EMAIL and SUPER_ADMIN_PASSWORD must both be set to bootstrap an admin");
        }
        (None, None) => {}
    }

    let state = Arc::new(AppState::new(conn, config.clone()));
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
