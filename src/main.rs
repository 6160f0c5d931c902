mod backend;
mod config;
mod maintenance;
mod store;
mod web;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{config::PortalConfig, web::AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    if let Err(err) = app_main().await {
        error!(?err, "application error");
        std::process::exit(1);
    }
}

async fn app_main() -> Result<()> {
    let config = PortalConfig::from_env()?;

    let state = AppState::new(&config).await?;
    state.ensure_seed_admin(&config.seed_admin).await?;

    maintenance::spawn(state.clone());

    let app = web::router::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, backend = %config.backend_origin, "listening");

    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
