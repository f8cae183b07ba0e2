use axum::http::{HeaderName, HeaderValue, Method};
use campaign_controller_core::{AccessPolicy, AllowList};
use thiserror::Error;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Builds the tower-http layer enforcing `policy`.
///
/// Browsers reject a literal `*` once credentials are allowed, so wildcard
/// methods and headers mirror the preflight request instead.
pub fn layer_for(policy: &AccessPolicy) -> Result<CorsLayer, CorsError> {
    let origins = policy
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| CorsError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let methods = match &policy.allowed_methods {
        AllowList::Any if policy.allow_credentials => AllowMethods::mirror_request(),
        AllowList::Any => AllowMethods::any(),
        AllowList::Only(methods) => AllowMethods::list(
            methods
                .iter()
                .map(|method| {
                    Method::from_bytes(method.as_bytes())
                        .map_err(|_| CorsError::InvalidMethod(method.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };

    let headers = match &policy.allowed_headers {
        AllowList::Any if policy.allow_credentials => AllowHeaders::mirror_request(),
        AllowList::Any => AllowHeaders::any(),
        AllowList::Only(headers) => AllowHeaders::list(
            headers
                .iter()
                .map(|header| {
                    HeaderName::from_bytes(header.as_bytes())
                        .map_err(|_| CorsError::InvalidHeader(header.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(policy.allow_credentials))
}

#[derive(Debug, Error)]
pub enum CorsError {
    #[error("invalid allowed origin '{0}'")]
    InvalidOrigin(String),
    #[error("invalid allowed method '{0}'")]
    InvalidMethod(String),
    #[error("invalid allowed header '{0}'")]
    InvalidHeader(String),
}
