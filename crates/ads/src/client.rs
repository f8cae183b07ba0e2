use std::{fmt, sync::Arc, time::Duration};

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use url::Url;

use crate::credentials::ServiceAccountCredentials;
use crate::GateError;

pub const API_VERSION: &str = "v21";
pub const DEFAULT_BASE_URL: &str = "https://googleads.googleapis.com/";

const USER_AGENT: &str = concat!("campaign-controller/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Kinds of service clients derived from the root client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientKind {
    GoogleAdsService,
    CampaignService,
}

impl ClientKind {
    pub const ALL: [ClientKind; 2] = [Self::GoogleAdsService, Self::CampaignService];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GoogleAdsService => "google-ads-service",
            Self::CampaignService => "campaign-service",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root client for the advertising platform API.
///
/// Building it only assembles the local HTTP transport; no request is sent.
#[derive(Clone)]
pub struct AdsClient {
    inner: Arc<ClientContext>,
}

struct ClientContext {
    http: Client,
    base_url: Url,
    developer_token: String,
    login_customer_id: u64,
    credentials: ServiceAccountCredentials,
}

impl AdsClient {
    /// Validates the construction parameters and builds the transport.
    pub fn new(
        developer_token: &str,
        login_customer_id: &str,
        credentials: ServiceAccountCredentials,
        base_url: Url,
    ) -> Result<Self, GateError> {
        let developer_token = developer_token.trim();
        if developer_token.is_empty() {
            return Err(GateError::ClientConstruction(
                "developer token is empty".to_string(),
            ));
        }
        let login_customer_id = parse_customer_id(login_customer_id)?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| GateError::ClientConstruction(err.to_string()))?;

        Ok(Self {
            inner: Arc::new(ClientContext {
                http,
                base_url,
                developer_token: developer_token.to_string(),
                login_customer_id,
                credentials,
            }),
        })
    }

    pub fn login_customer_id(&self) -> u64 {
        self.inner.login_customer_id
    }

    /// Derives the service client of the requested kind for the pinned API version.
    pub fn derive(&self, kind: ClientKind) -> Result<DerivedClient, GateError> {
        let service = self
            .derive_service(kind)
            .map_err(|source| GateError::Derivation { kind, source })?;
        Ok(match kind {
            ClientKind::GoogleAdsService => {
                DerivedClient::GoogleAdsService(GoogleAdsServiceClient { service })
            }
            ClientKind::CampaignService => {
                DerivedClient::CampaignService(CampaignServiceClient { service })
            }
        })
    }

    fn derive_service(&self, kind: ClientKind) -> Result<ServiceClient, url::ParseError> {
        let versioned = self.inner.base_url.join(&format!("{API_VERSION}/"))?;
        Ok(ServiceClient {
            root: self.clone(),
            kind,
            versioned,
        })
    }
}

impl fmt::Debug for AdsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdsClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("login_customer_id", &self.inner.login_customer_id)
            .field("client_email", &self.inner.credentials.client_email)
            .finish_non_exhaustive()
    }
}

/// Accepts plain digits or the dashed `ddd-ddd-dddd` display form.
fn parse_customer_id(raw: &str) -> Result<u64, GateError> {
    let invalid = |reason: &str| GateError::InvalidAccountId {
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let trimmed = raw.trim();
    let groups: Vec<&str> = trimmed.split('-').collect();
    let digits = match groups.as_slice() {
        [plain] => plain.to_string(),
        [a, b, c] if a.len() == 3 && b.len() == 3 && c.len() == 4 => format!("{a}{b}{c}"),
        _ => return Err(invalid("expected digits or the ddd-ddd-dddd form")),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("customer id must contain only decimal digits"));
    }
    let id = digits
        .parse::<u64>()
        .map_err(|err| invalid(&err.to_string()))?;
    if id == 0 {
        return Err(invalid("customer id must be positive"));
    }
    Ok(id)
}

#[derive(Clone)]
struct ServiceClient {
    root: AdsClient,
    kind: ClientKind,
    versioned: Url,
}

impl ServiceClient {
    fn customer_url(&self, customer_id: u64, method: &str) -> Result<Url, url::ParseError> {
        self.versioned
            .join(&format!("customers/{customer_id}/{method}"))
    }

    fn authorized_request(&self, method: Method, url: Url, access_token: &str) -> RequestBuilder {
        let context = &self.root.inner;
        context
            .http
            .request(method, url)
            .header("developer-token", &context.developer_token)
            .header("login-customer-id", context.login_customer_id.to_string())
            .header("Authorization", format!("Bearer {access_token}"))
    }
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("kind", &self.kind)
            .field("versioned", &self.versioned.as_str())
            .finish()
    }
}

/// Client for the query service (`googleAds:search`).
#[derive(Debug, Clone)]
pub struct GoogleAdsServiceClient {
    service: ServiceClient,
}

impl GoogleAdsServiceClient {
    pub fn search_url(&self, customer_id: u64) -> Result<Url, url::ParseError> {
        self.service.customer_url(customer_id, "googleAds:search")
    }

    /// Prepares an authorized search request. Sending it is up to the caller.
    pub fn search_request(
        &self,
        access_token: &str,
        customer_id: u64,
        query: &str,
    ) -> Result<RequestBuilder, url::ParseError> {
        let url = self.search_url(customer_id)?;
        Ok(self
            .service
            .authorized_request(Method::POST, url, access_token)
            .json(&serde_json::json!({ "query": query })))
    }
}

/// Client for campaign mutations (`campaigns:mutate`).
#[derive(Debug, Clone)]
pub struct CampaignServiceClient {
    service: ServiceClient,
}

impl CampaignServiceClient {
    pub fn mutate_url(&self, customer_id: u64) -> Result<Url, url::ParseError> {
        self.service.customer_url(customer_id, "campaigns:mutate")
    }

    /// Prepares an authorized mutate request carrying the given operations.
    pub fn mutate_request(
        &self,
        access_token: &str,
        customer_id: u64,
        operations: &serde_json::Value,
    ) -> Result<RequestBuilder, url::ParseError> {
        let url = self.mutate_url(customer_id)?;
        Ok(self
            .service
            .authorized_request(Method::POST, url, access_token)
            .json(&serde_json::json!({ "operations": operations })))
    }
}

/// A service client derived from the root client.
#[derive(Debug, Clone)]
pub enum DerivedClient {
    GoogleAdsService(GoogleAdsServiceClient),
    CampaignService(CampaignServiceClient),
}

impl DerivedClient {
    pub fn kind(&self) -> ClientKind {
        self.service().kind
    }

    /// Versioned API root the client talks to.
    pub fn endpoint(&self) -> &Url {
        &self.service().versioned
    }

    fn service(&self) -> &ServiceClient {
        match self {
            Self::GoogleAdsService(client) => &client.service,
            Self::CampaignService(client) => &client.service,
        }
    }
}
