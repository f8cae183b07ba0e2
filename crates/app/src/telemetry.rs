use std::{
    fmt::Write as _,
    sync::{Mutex, OnceLock},
    time::Instant,
};

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;
use tracing_subscriber::{
    fmt::{self as tracing_fmt, time::UtcTime},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use campaign_controller_util::{AppConfig, LogFormat};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize tracing: {0}")]
    Tracing(#[from] TryInitError),
    #[error("failed to initialize prometheus recorder: {0}")]
    Metrics(#[from] BuildError),
}

static TRACING_READY: OnceLock<()> = OnceLock::new();
/// Installed recorder handle; the lock also serializes installation.
static RECORDER: Mutex<Option<PrometheusHandle>> = Mutex::new(None);
static STARTED_AT: OnceLock<Instant> = OnceLock::new();

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn git_sha() -> &'static str {
    option_env!("GIT_SHA").unwrap_or("unknown")
}

/// Installs the global subscriber once. `RUST_LOG` overrides the `info` default.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryError> {
    if TRACING_READY.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (pretty, json) = match config.log_format {
        LogFormat::Pretty => (
            Some(
                tracing_fmt::layer()
                    .with_target(false)
                    .with_timer(UtcTime::rfc_3339())
                    .pretty(),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_fmt::layer()
                    .with_target(false)
                    .with_timer(UtcTime::rfc_3339())
                    .json(),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()?;
    TRACING_READY.set(()).ok();

    tracing::info!(
        stage = "telemetry",
        format = config.log_format.as_str(),
        profiles = ?config.profiles,
        version = VERSION,
        git_sha = git_sha(),
        "tracing initialized"
    );
    Ok(())
}

/// Returns the process-wide Prometheus handle, installing the recorder on first use.
pub fn init_metrics() -> Result<PrometheusHandle, TelemetryError> {
    let mut slot = RECORDER
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    STARTED_AT.get_or_init(Instant::now);
    *slot = Some(handle.clone());
    Ok(handle)
}

fn describe_metrics() {
    describe_gauge!(
        "ads_integration_enabled",
        "1 when the ads integration resolved to enabled at startup, 0 otherwise"
    );
    describe_gauge!(
        "cors_policy_installed",
        "1 when a cross-origin policy is registered for the API scope, labelled by profile"
    );
    describe_counter!(
        "scheduled_ticks_total",
        "Count of scheduled integration ticks, labelled by outcome"
    );
    describe_counter!(
        "api_integration_requests_total",
        "Count of integration API requests, labelled by result"
    );
}

/// Recorder output followed by the build and uptime gauges.
pub fn render_metrics(handle: &PrometheusHandle) -> String {
    let mut body = handle.render();
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }

    let uptime = STARTED_AT
        .get()
        .map_or(0.0, |start| start.elapsed().as_secs_f64());
    let _ = write!(
        body,
        "# HELP app_build_info Build metadata for the running binary\n\
         # TYPE app_build_info gauge\n\
         app_build_info{{version=\"{VERSION}\",git=\"{git}\"}} 1\n\
         # HELP app_uptime_seconds Seconds since the process started\n\
         # TYPE app_uptime_seconds gauge\n\
         app_uptime_seconds {uptime}\n",
        git = git_sha(),
    );
    body
}
