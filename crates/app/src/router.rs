use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use campaign_controller_ads::{ClientKind, IntegrationState, API_VERSION};
use campaign_controller_core::{scope_prefix, AccessPolicy, API_SCOPE};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::cors::{self, CorsError};
use crate::problem::ProblemResponse;
use crate::telemetry;

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    integration: Arc<IntegrationState>,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, integration: Arc<IntegrationState>) -> Self {
        Self {
            metrics,
            integration,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn integration(&self) -> &IntegrationState {
        &self.integration
    }
}

/// Builds the HTTP surface. The CORS layer covers the API scope only, and
/// only when a policy was resolved at startup.
pub fn app_router(state: AppState, policy: Option<&AccessPolicy>) -> Result<Router, CorsError> {
    let api = Router::new()
        .route("/integration", get(integration_status))
        .route("/integration/clients/:kind", get(integration_client));

    let (prefix, api) = match policy {
        Some(policy) => (policy.route_prefix(), api.layer(cors::layer_for(policy)?)),
        None => (scope_prefix(API_SCOPE), api),
    };

    Ok(Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .nest(prefix, api)
        .with_state(state))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        Body::from(body),
    )
}

#[derive(Debug, Serialize)]
struct IntegrationStatus {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_version: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_customer_id: Option<u64>,
    clients: Vec<ClientKind>,
}

async fn integration_status(State(state): State<AppState>) -> Json<IntegrationStatus> {
    let integration = state.integration();
    let status = match integration.root() {
        Ok(root) => IntegrationStatus {
            enabled: true,
            api_version: Some(API_VERSION),
            login_customer_id: Some(root.login_customer_id()),
            clients: ClientKind::ALL
                .into_iter()
                .filter(|kind| integration.client(*kind).is_ok())
                .collect(),
        },
        Err(_) => IntegrationStatus {
            enabled: false,
            api_version: None,
            login_customer_id: None,
            clients: Vec::new(),
        },
    };
    Json(status)
}

#[derive(Debug, Serialize)]
struct ClientDescription {
    kind: ClientKind,
    endpoint: String,
}

async fn integration_client(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ClientDescription>, ProblemResponse> {
    let Some(kind) = ClientKind::parse(&kind) else {
        counter!("api_integration_requests_total", "result" => "unknown_kind").increment(1);
        return Err(ProblemResponse::new(
            StatusCode::NOT_FOUND,
            "unknown_client_kind",
            format!("no client named '{kind}'"),
        ));
    };

    let client = state.integration().client(kind).map_err(|err| {
        counter!("api_integration_requests_total", "result" => "not_configured").increment(1);
        ProblemResponse::from(err)
    })?;

    counter!("api_integration_requests_total", "result" => "ok").increment(1);
    Ok(Json(ClientDescription {
        kind: client.kind(),
        endpoint: client.endpoint().to_string(),
    }))
}
