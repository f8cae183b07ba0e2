use std::{fmt, fs, io, path::Path};

use serde::Deserialize;

use crate::GateError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Reads raw credential documents.
pub trait CredentialSource: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads credential documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCredentialSource;

impl CredentialSource for FsCredentialSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// Service-account key document issued by the advertising platform's identity provider.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ServiceAccountCredentials {
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountCredentials {
    /// Loads and validates the document at `path` through `source`.
    pub fn load(source: &dyn CredentialSource, path: &Path) -> Result<Self, GateError> {
        let bytes = source
            .read(path)
            .map_err(|err| GateError::CredentialsUnreadable {
                path: path.to_path_buf(),
                source: err,
            })?;
        let credentials: Self =
            serde_json::from_slice(&bytes).map_err(|err| GateError::CredentialsMalformed {
                path: path.to_path_buf(),
                source: err,
            })?;
        credentials.validate()?;
        Ok(credentials)
    }

    fn validate(&self) -> Result<(), GateError> {
        if self.account_type != SERVICE_ACCOUNT_TYPE {
            return Err(GateError::InvalidCredentials(format!(
                "expected credential type '{SERVICE_ACCOUNT_TYPE}', got '{}'",
                self.account_type
            )));
        }
        if self.client_email.trim().is_empty() {
            return Err(GateError::InvalidCredentials(
                "client_email is empty".to_string(),
            ));
        }
        if !self.private_key.contains("-----BEGIN") {
            return Err(GateError::InvalidCredentials(
                "private_key is not PEM encoded".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("account_type", &self.account_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
