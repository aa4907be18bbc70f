use std::sync::Arc;

use board_api::config::AppConfig;
use board_api::repositories::PgStore;
use board_api::{build_router, AppState};
use board_shared::clients::db::create_pool;
use board_shared::clients::email::EmailClient;
use board_shared::middleware::{init_metrics, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("board-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let pool = create_pool(&config.database_url, config.db_pool_size)?;
    let mailer = EmailClient::new(
        &config.mail_api_url,
        &config.mail_api_key,
        &config.mail_from_email,
        &config.mail_from_name,
    );
    let metrics_handle = init_metrics()?;

    let state = AppState::new(config, PgStore::new(pool), Arc::new(mailer)).with_metrics(metrics_handle);
    let app = build_router(Arc::new(state));

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "board-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
