use std::sync::Arc;

use easyblog::{api, config::AppConfig, db, AppState};
use poem::{listener::TcpListener, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = AppConfig::from_env();
    let db = db::connect(&cfg).await?;
    db::initialize(&db).await?;

    let address = cfg.address.clone();
    let state = Arc::new(AppState { db, config: cfg });
    let app = api::app(state);

    tracing::info!(%address, "easyblog backend listening");
    Server::new(TcpListener::bind(address)).run(app).await?;
    Ok(())
}
