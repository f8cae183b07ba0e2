mod bootstrap;
mod cors;
mod problem;
mod router;
mod scheduler;
mod telemetry;

use std::net::SocketAddr;

use campaign_controller_util::{load_env_file, AppConfig};
use tracing::info;

use crate::bootstrap::Bootstrap;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let Bootstrap {
        integration,
        access_policy,
    } = Bootstrap::initialize(&config)?;

    scheduler::IntegrationTicker::new(integration.clone()).spawn();

    let state = router::AppState::new(metrics, integration);
    let app = router::app_router(state, access_policy.as_ref())?;

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, profiles = ?config.profiles, "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await.map_err(|err| err.into())
}
