pub mod client;
pub mod credentials;
pub mod gate;

use std::path::PathBuf;

use thiserror::Error;

pub use client::{
    AdsClient, CampaignServiceClient, ClientKind, DerivedClient, GoogleAdsServiceClient,
    API_VERSION, DEFAULT_BASE_URL,
};
pub use credentials::{CredentialSource, FsCredentialSource, ServiceAccountCredentials};
pub use gate::{resolve, CapabilityGate, EnabledIntegration, IntegrationState};

/// Returned when a client is requested from a disabled integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ads integration is not configured")]
pub struct NotConfigured;

/// Fatal startup errors raised while enabling the integration.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("failed to read credentials from {}", path.display())]
    CredentialsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credentials at {} are not a service account document", path.display())]
    CredentialsMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("invalid login customer id '{value}': {reason}")]
    InvalidAccountId { value: String, reason: String },
    #[error("failed to construct ads client: {0}")]
    ClientConstruction(String),
    #[error("failed to derive {kind} client")]
    Derivation {
        kind: ClientKind,
        #[source]
        source: url::ParseError,
    },
}
