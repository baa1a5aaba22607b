use std::env;

/// Runtime configuration, read once at startup from the environment
/// (with `.env` support via dotenvy in `main`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Listen address, e.g. `0.0.0.0:7966`.
    pub address: String,
    /// sea-orm connection string (postgres or sqlite).
    pub database_url: String,
    /// Symmetric secret for HS256 token signatures.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub jwt_expire_hours: i64,
}

const DEFAULT_ADDRESS: &str = "0.0.0.0:7966";
const DEFAULT_DATABASE_URL: &str = "sqlite://easyblog.db?mode=rwc";
const DEFAULT_JWT_EXPIRE_HOURS: i64 = 72;

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = match env::var("EASYBLOG_JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("EASYBLOG_JWT_SECRET not set, using an insecure development secret");
                "easyblog-dev-secret".to_string()
            }
        };
        Self {
            address: env::var("EASYBLOG_ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret,
            jwt_expire_hours: env::var("EASYBLOG_JWT_EXPIRE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|hours| *hours > 0)
                .unwrap_or(DEFAULT_JWT_EXPIRE_HOURS),
        }
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            address: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expire_hours: DEFAULT_JWT_EXPIRE_HOURS,
        }
    }
}
