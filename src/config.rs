use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cors_origin: Option<String>,
    pub super_admin_email: Option<String>,
    pub super_admin_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbook.db".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "changeme".to_string()),
            jwt_ttl_hours: env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(24),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
            super_admin_email: env::var("SUPER_ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            super_admin_password: env::var("SUPER_ADMIN_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }
}
