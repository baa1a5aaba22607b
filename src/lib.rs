pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod migration;
pub mod store;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

/// Shared application state, constructed once at startup and handed to each
/// request scope by reference. No other ambient state exists.
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
}
