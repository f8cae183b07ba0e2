use std::{collections::BTreeMap, path::Path};

use campaign_controller_util::IntegrationConfig;
use tracing::{debug, info};
use url::Url;

use crate::client::{
    AdsClient, CampaignServiceClient, ClientKind, DerivedClient, GoogleAdsServiceClient,
    DEFAULT_BASE_URL,
};
use crate::credentials::{CredentialSource, FsCredentialSource, ServiceAccountCredentials};
use crate::{GateError, NotConfigured};

/// Resolved integration, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub enum IntegrationState {
    Disabled,
    Enabled(EnabledIntegration),
}

/// Root client plus every declared derived client, built from one configuration.
#[derive(Debug, Clone)]
pub struct EnabledIntegration {
    root: AdsClient,
    derived: BTreeMap<ClientKind, DerivedClient>,
}

impl IntegrationState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    pub fn root(&self) -> Result<&AdsClient, NotConfigured> {
        match self {
            Self::Enabled(integration) => Ok(&integration.root),
            Self::Disabled => Err(NotConfigured),
        }
    }

    /// Returns the derived client of `kind`, or [`NotConfigured`] when disabled.
    pub fn client(&self, kind: ClientKind) -> Result<&DerivedClient, NotConfigured> {
        match self {
            Self::Enabled(integration) => integration.derived.get(&kind).ok_or(NotConfigured),
            Self::Disabled => Err(NotConfigured),
        }
    }

    pub fn google_ads_service(&self) -> Result<&GoogleAdsServiceClient, NotConfigured> {
        match self.client(ClientKind::GoogleAdsService)? {
            DerivedClient::GoogleAdsService(client) => Ok(client),
            DerivedClient::CampaignService(_) => Err(NotConfigured),
        }
    }

    pub fn campaign_service(&self) -> Result<&CampaignServiceClient, NotConfigured> {
        match self.client(ClientKind::CampaignService)? {
            DerivedClient::CampaignService(client) => Ok(client),
            DerivedClient::GoogleAdsService(_) => Err(NotConfigured),
        }
    }
}

/// Decides once whether the advertising integration is usable.
pub struct CapabilityGate<S = FsCredentialSource> {
    source: S,
    base_url: Url,
}

impl CapabilityGate<FsCredentialSource> {
    /// Gate reading credentials from the filesystem against the production API.
    pub fn new() -> Result<Self, GateError> {
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|err| GateError::ClientConstruction(err.to_string()))?;
        Ok(Self::with_source(FsCredentialSource, base_url))
    }
}

impl<S: CredentialSource> CapabilityGate<S> {
    pub fn with_source(source: S, base_url: Url) -> Self {
        Self { source, base_url }
    }

    /// Resolves the integration state for `config`.
    ///
    /// A disabled flag or any sentinel value yields [`IntegrationState::Disabled`]
    /// without touching the credential source. Otherwise every failure is
    /// returned as an error: real configuration was asserted, so falling back to
    /// `Disabled` would hide it.
    pub fn resolve(&self, config: &IntegrationConfig) -> Result<IntegrationState, GateError> {
        if !config.enabled {
            info!(stage = "gate", reason = "feature_flag_off", "ads integration disabled");
            return Ok(IntegrationState::Disabled);
        }
        if let Some(field) = config.sentinel_field() {
            info!(stage = "gate", reason = "sentinel", %field, "ads integration disabled");
            return Ok(IntegrationState::Disabled);
        }

        let path = Path::new(&config.credentials_path);
        let credentials = ServiceAccountCredentials::load(&self.source, path)?;
        debug!(
            stage = "gate",
            client_email = %credentials.client_email,
            private_key_id = %credentials.private_key_id,
            "service account credentials loaded"
        );

        let root = AdsClient::new(
            &config.developer_token,
            &config.account_id,
            credentials,
            self.base_url.clone(),
        )?;
        let derived = ClientKind::ALL
            .into_iter()
            .map(|kind| root.derive(kind).map(|client| (kind, client)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        info!(
            stage = "gate",
            login_customer_id = root.login_customer_id(),
            clients = derived.len(),
            "ads integration enabled"
        );
        Ok(IntegrationState::Enabled(EnabledIntegration { root, derived }))
    }
}

/// Resolves `config` against the filesystem and the production API endpoint.
pub fn resolve(config: &IntegrationConfig) -> Result<IntegrationState, GateError> {
    CapabilityGate::new()?.resolve(config)
}
