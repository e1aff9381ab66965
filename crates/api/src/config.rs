use std::str::FromStr;
use std::time::Duration;

use jqlgate_jira::JiraTimeouts;

use crate::auth::jwt::JwtConfig;
use crate::middleware::rate_limit::{RateLimitConfig, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set in production")]
    Missing(&'static str),
}

/// Deployment mode, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Development,
    Production,
}

impl DeploymentMode {
    pub fn is_development(self) -> bool {
        self == DeploymentMode::Development
    }
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(DeploymentMode::Development),
            "production" | "prod" => Ok(DeploymentMode::Production),
            other => Err(format!("unknown deployment mode '{other}'")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the production signing secret have defaults suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3003`).
    pub port: u16,
    pub mode: DeploymentMode,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Also admit origins on private (RFC 1918) IPv4 hosts.
    pub cors_allow_private_network: bool,
    /// Whole-request timeout in seconds (default: `45`, above the search timeout).
    pub request_timeout_secs: u64,
    /// Maximum JSON body size in bytes (default: 10 MiB).
    pub body_limit_bytes: usize,
    /// Session token configuration (secret, lifetime).
    pub jwt: JwtConfig,
    /// Outbound Jira call timeouts.
    pub jira_timeouts: JiraTimeouts,
    /// Per-client request allowance.
    pub rate_limit: RateLimitConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                                        |
    /// |------------------------------|------------------------------------------------|
    /// | `HOST`                       | `0.0.0.0`                                      |
    /// | `PORT`                       | `3003`                                         |
    /// | `APP_ENV`                    | `development`                                  |
    /// | `CORS_ORIGINS`               | `http://localhost:3000,http://127.0.0.1:3000`  |
    /// | `CORS_ALLOW_PRIVATE_NETWORK` | `true`                                         |
    /// | `REQUEST_TIMEOUT_SECS`       | `45`                                           |
    /// | `BODY_LIMIT_BYTES`           | `10485760`                                     |
    /// | `JIRA_METADATA_TIMEOUT_SECS` | `10`                                           |
    /// | `JIRA_SEARCH_TIMEOUT_SECS`   | `30`                                           |
    /// | `RATE_LIMIT_MAX_REQUESTS`    | `100` (`0` disables the limiter)               |
    /// | `RATE_LIMIT_WINDOW_SECS`     | `900`                                          |
    ///
    /// The search timeout must be shorter than the request timeout, otherwise
    /// a slow search would be cut off by the 408 layer first.
    ///
    /// See [`JwtConfig::from_env`] for the token settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3003)?;
        let mode: DeploymentMode = env_or("APP_ENV", DeploymentMode::Development)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let cors_allow_private_network = env_or("CORS_ALLOW_PRIVATE_NETWORK", true)?;

        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", 45)?;
        let body_limit_bytes = env_or("BODY_LIMIT_BYTES", 10 * 1024 * 1024)?;

        let jira_timeouts = JiraTimeouts {
            metadata: Duration::from_secs(env_or("JIRA_METADATA_TIMEOUT_SECS", 10)?),
            search: Duration::from_secs(env_or("JIRA_SEARCH_TIMEOUT_SECS", 30)?),
        };
        check_timeouts(request_timeout_secs, &jira_timeouts)?;

        let rate_limit = RateLimitConfig {
            max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", DEFAULT_MAX_REQUESTS)?,
            window: Duration::from_secs(env_or(
                "RATE_LIMIT_WINDOW_SECS",
                DEFAULT_WINDOW.as_secs(),
            )?),
        };

        let jwt = JwtConfig::from_env(mode)?;

        Ok(Self {
            host,
            port,
            mode,
            cors_origins,
            cors_allow_private_network,
            request_timeout_secs,
            body_limit_bytes,
            jwt,
            jira_timeouts,
            rate_limit,
        })
    }
}

/// Outbound calls must finish inside the whole-request timeout.
pub(crate) fn check_timeouts(
    request_timeout_secs: u64,
    jira_timeouts: &JiraTimeouts,
) -> Result<(), ConfigError> {
    if request_timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            key: "REQUEST_TIMEOUT_SECS",
            value: request_timeout_secs.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    for (key, timeout) in [
        ("JIRA_METADATA_TIMEOUT_SECS", jira_timeouts.metadata),
        ("JIRA_SEARCH_TIMEOUT_SECS", jira_timeouts.search),
    ] {
        if timeout.as_secs() >= request_timeout_secs {
            return Err(ConfigError::Invalid {
                key,
                value: timeout.as_secs().to_string(),
                reason: format!(
                    "must be less than REQUEST_TIMEOUT_SECS ({request_timeout_secs})"
                ),
            });
        }
    }
    Ok(())
}

/// Parse `key` from the environment, falling back to `default` when unset.
pub(crate) fn env_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn deployment_mode_parses_aliases() {
        assert_eq!("production".parse::<DeploymentMode>(), Ok(DeploymentMode::Production));
        assert_eq!(" Dev ".parse::<DeploymentMode>(), Ok(DeploymentMode::Development));
        assert!("staging".parse::<DeploymentMode>().is_err());
    }

    #[test]
    fn env_or_uses_default_when_unset() {
        let value: u16 = env_or("JQLGATE_TEST_UNSET_PORT", 4242).unwrap();
        assert_eq!(value, 4242);
    }

    #[test]
    fn env_or_rejects_garbage() {
        std::env::set_var("JQLGATE_TEST_BAD_PORT", "not-a-port");
        let result: Result<u16, _> = env_or("JQLGATE_TEST_BAD_PORT", 1);
        assert_matches!(result, Err(ConfigError::Invalid { key: "JQLGATE_TEST_BAD_PORT", .. }));
        std::env::remove_var("JQLGATE_TEST_BAD_PORT");
    }

    fn timeouts(metadata: u64, search: u64) -> JiraTimeouts {
        JiraTimeouts {
            metadata: Duration::from_secs(metadata),
            search: Duration::from_secs(search),
        }
    }

    #[test]
    fn default_timeouts_fit_inside_request_timeout() {
        assert!(check_timeouts(45, &JiraTimeouts::default()).is_ok());
    }

    #[test]
    fn search_timeout_must_be_below_request_timeout() {
        assert_matches!(
            check_timeouts(30, &timeouts(10, 30)),
            Err(ConfigError::Invalid { key: "JIRA_SEARCH_TIMEOUT_SECS", .. })
        );
        assert_matches!(
            check_timeouts(30, &timeouts(10, 60)),
            Err(ConfigError::Invalid { key: "JIRA_SEARCH_TIMEOUT_SECS", .. })
        );
        assert!(check_timeouts(31, &timeouts(10, 30)).is_ok());
    }

    #[test]
    fn metadata_timeout_must_be_below_request_timeout() {
        assert_matches!(
            check_timeouts(10, &timeouts(10, 5)),
            Err(ConfigError::Invalid { key: "JIRA_METADATA_TIMEOUT_SECS", .. })
        );
    }

    #[test]
    fn zero_request_timeout_is_rejected() {
        assert_matches!(
            check_timeouts(0, &timeouts(0, 0)),
            Err(ConfigError::Invalid { key: "REQUEST_TIMEOUT_SECS", .. })
        );
    }
}
