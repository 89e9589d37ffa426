use anyhow::{Context, Result};
use chrono::Utc;
use lmp_forecast::{api, config::Config, forecast::ForecastEngine, state::AppState, telemetry};
use telemetry::init_tracing;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        error!(error = ?e, "startup failed");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let cfg = Config::load()?;

    let engine = ForecastEngine::from_config(&cfg)?;
    let forecast = engine
        .run(Utc::now())
        .await
        .context("forecast pipeline failed")?;

    let addr = cfg.server.socket_addr()?;
    if cfg.server.host == "0.0.0.0" {
        warn!("dashboard binding to 0.0.0.0, reachable from the network");
    }

    let app = api::router(AppState::new(cfg, forecast));

    info!(%addr, "serving LMP forecast dashboard");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
