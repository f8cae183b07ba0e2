use std::{env, fmt, net::SocketAddr};

use super::server_bind_address;

pub const SENTINEL_DEVELOPER_TOKEN: &str = "dummy-token";
pub const SENTINEL_CREDENTIALS_PATH: &str = "/dev/null";
pub const SENTINEL_ACCOUNT_ID: &str = "0000000000";

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

/// Settings for the advertising-platform integration.
///
/// The three strings are passed through untouched; deciding whether they
/// describe a usable integration is the capability gate's job.
#[derive(Clone, PartialEq, Eq)]
pub struct IntegrationConfig {
    pub enabled: bool,
    pub developer_token: String,
    pub credentials_path: String,
    pub account_id: String,
}

impl IntegrationConfig {
    /// Builds an enabled configuration from the three integration values.
    pub fn new(
        developer_token: impl Into<String>,
        credentials_path: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            enabled: true,
            developer_token: developer_token.into(),
            credentials_path: credentials_path.into(),
            account_id: account_id.into(),
        }
    }

    /// Configuration that resolves to "intentionally not configured".
    pub fn unconfigured() -> Self {
        Self {
            enabled: false,
            developer_token: SENTINEL_DEVELOPER_TOKEN.to_string(),
            credentials_path: SENTINEL_CREDENTIALS_PATH.to_string(),
            account_id: SENTINEL_ACCOUNT_ID.to_string(),
        }
    }

    /// Returns the name of the first field holding a reserved "unconfigured" value.
    pub fn sentinel_field(&self) -> Option<&'static str> {
        if self.developer_token == SENTINEL_DEVELOPER_TOKEN {
            Some("developer_token")
        } else if self.credentials_path == SENTINEL_CREDENTIALS_PATH {
            Some("credentials_path")
        } else if self.account_id == SENTINEL_ACCOUNT_ID {
            Some("account_id")
        } else {
            None
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let enabled = match env::var("ADS_ENABLED") {
            Ok(value) => parse_flag("ADS_ENABLED", &value)?,
            Err(_) => false,
        };

        Ok(Self {
            enabled,
            developer_token: env::var("ADS_DEVELOPER_TOKEN")
                .unwrap_or_else(|_| SENTINEL_DEVELOPER_TOKEN.to_string()),
            credentials_path: env::var("ADS_SERVICE_ACCOUNT_SECRETS_PATH")
                .unwrap_or_else(|_| SENTINEL_CREDENTIALS_PATH.to_string()),
            account_id: env::var("ADS_LOGIN_CUSTOMER_ID")
                .unwrap_or_else(|_| SENTINEL_ACCOUNT_ID.to_string()),
        })
    }
}

// The developer token is a secret.
impl fmt::Debug for IntegrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationConfig")
            .field("enabled", &self.enabled)
            .field("developer_token", &"<redacted>")
            .field("credentials_path", &self.credentials_path)
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    /// Active deployment profiles in the order they were declared.
    pub profiles: Vec<String>,
    pub integration: IntegrationConfig,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let format_value = env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
        let log_format = LogFormat::from_str(&format_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;
        let profiles = env::var("APP_PROFILES")
            .map(|raw| parse_profiles(&raw))
            .unwrap_or_default();
        let integration = IntegrationConfig::from_env()?;

        Ok(Self {
            bind_addr,
            log_format,
            profiles,
            integration,
        })
    }
}

fn parse_profiles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ConfigError::InvalidFlag {
            name,
            value: other.to_string(),
        }),
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidLogFormat(String),
    InvalidFlag { name: &'static str, value: String },
    BindAddress(std::net::AddrParseError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLogFormat(value) => write!(
                f,
                "APP_LOG_FORMAT must be one of 'pretty' or 'json' (got {value})"
            ),
            Self::InvalidFlag { name, value } => {
                write!(f, "{name} must be 'true' or 'false' (got {value})")
            }
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_BIND_ADDR, ENV_GUARD};

    const VARS: [&str; 7] = [
        "APP_LOG_FORMAT",
        "APP_BIND_ADDR",
        "APP_PROFILES",
        "ADS_ENABLED",
        "ADS_DEVELOPER_TOKEN",
        "ADS_SERVICE_ACCOUNT_SECRETS_PATH",
        "ADS_LOGIN_CUSTOMER_ID",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_unconfigured_defaults() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();

        let config = AppConfig::from_env().expect("config should load with defaults");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(config.profiles.is_empty());
        assert_eq!(config.integration, IntegrationConfig::unconfigured());
        assert_eq!(config.integration.sentinel_field(), Some("developer_token"));
    }

    #[test]
    fn parses_profiles_and_integration_values() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("APP_PROFILES", " local, ,stage ");
        env::set_var("ADS_ENABLED", "true");
        env::set_var("ADS_DEVELOPER_TOKEN", "token-abc");
        env::set_var("ADS_SERVICE_ACCOUNT_SECRETS_PATH", "/secrets/sa.json");
        env::set_var("ADS_LOGIN_CUSTOMER_ID", "1234567890");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.profiles, vec!["local".to_string(), "stage".to_string()]);
        assert_eq!(
            config.integration,
            IntegrationConfig::new("token-abc", "/secrets/sa.json", "1234567890")
        );
        assert_eq!(config.integration.sentinel_field(), None);

        clear_env();
    }

    #[test]
    fn rejects_invalid_log_format() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("APP_LOG_FORMAT", "xml");

        let err = AppConfig::from_env().expect_err("invalid format should error");
        assert!(matches!(err, ConfigError::InvalidLogFormat(value) if value == "xml"));

        clear_env();
    }

    #[test]
    fn rejects_invalid_feature_flag() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("ADS_ENABLED", "yes");

        let err = AppConfig::from_env().expect_err("invalid flag should error");
        assert!(matches!(
            err,
            ConfigError::InvalidFlag { name: "ADS_ENABLED", ref value } if value == "yes"
        ));

        clear_env();
    }

    #[test]
    fn sentinel_detection_checks_each_field() {
        let account = IntegrationConfig::new("token", "/secrets/sa.json", SENTINEL_ACCOUNT_ID);
        assert_eq!(account.sentinel_field(), Some("account_id"));

        let path = IntegrationConfig::new("token", SENTINEL_CREDENTIALS_PATH, "1234567890");
        assert_eq!(path.sentinel_field(), Some("credentials_path"));
    }

    #[test]
    fn debug_output_redacts_developer_token() {
        let config = IntegrationConfig::new("super-secret", "/secrets/sa.json", "1234567890");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
