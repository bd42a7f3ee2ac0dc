/// Configuration management for the marketplace admin service
use crate::error::{AdminError, AdminResult};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
}

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "marketplace_admin=debug,tower_http=debug";

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

/// Bearer token verification settings
///
/// Tokens are issued by the platform auth service; this service only
/// verifies them with the shared key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret, or PEM public key for RSA/EC/EdDSA algorithms
    pub jwt_signing_key: String,
    pub jwt_algorithm: Algorithm,
    /// Allowed clock skew in seconds
    pub jwt_leeway_secs: u64,
    /// User ids accepted as admins even without a profile row
    pub admin_user_ids: Vec<i64>,
}

/// Upstream service addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub client_service_url: String,
    pub freelancer_service_url: String,
    pub review_service_url: String,
    pub notification_service_url: String,
    pub request_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            client_service_url: "http://client-service".to_string(),
            freelancer_service_url: "http://freelancer-service".to_string(),
            review_service_url: "http://review-service".to_string(),
            notification_service_url: "http://notification-service".to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AdminResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AdminResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let hostname = var("ADMIN_HOSTNAME", "0.0.0.0");
        let port = var("ADMIN_PORT", "8000")
            .parse()
            .map_err(|_| AdminError::Validation("Invalid port number".to_string()))?;

        let database_path = PathBuf::from(var("ADMIN_DATABASE_PATH", "./data/admin.sqlite"));

        let jwt_signing_key = lookup("JWT_SIGNING_KEY")
            .ok_or_else(|| AdminError::Validation("JWT signing key required".to_string()))?;
        let algorithm_name = var("JWT_ALGORITHM", "HS256");
        let jwt_algorithm = Algorithm::from_str(&algorithm_name).map_err(|_| {
            AdminError::Validation(format!("Unsupported JWT algorithm: {}", algorithm_name))
        })?;
        let jwt_leeway_secs = var("JWT_LEEWAY_SECS", "60").parse().unwrap_or(60);

        // Comma-separated list of admin user ids
        let admin_user_ids = var("ADMIN_USER_IDS", "")
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| AdminError::Validation(format!("Invalid admin user id: {}", s)))
            })
            .collect::<AdminResult<Vec<i64>>>()?;

        let defaults = UpstreamConfig::default();
        let upstream = UpstreamConfig {
            client_service_url: var("CLIENT_SERVICE_URL", &defaults.client_service_url),
            freelancer_service_url: var("FREELANCER_SERVICE_URL", &defaults.freelancer_service_url),
            review_service_url: var("REVIEW_SERVICE_URL", &defaults.review_service_url),
            notification_service_url: var(
                "NOTIFICATION_SERVICE_URL",
                &defaults.notification_service_url,
            ),
            request_timeout_secs: var("UPSTREAM_TIMEOUT_SECS", "5")
                .parse()
                .map_err(|_| AdminError::Validation("Invalid upstream timeout".to_string()))?,
        };

        let level = var("RUST_LOG", DEFAULT_LOG_FILTER);
        let json = var("LOG_FORMAT", "text").eq_ignore_ascii_case("json");

        Ok(ServerConfig {
            service: ServiceConfig { hostname, port },
            storage: StorageConfig { database_path },
            authentication: AuthConfig {
                jwt_signing_key,
                jwt_algorithm,
                jwt_leeway_secs,
                admin_user_ids,
            },
            upstream,
            logging: LoggingConfig { level, json },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AdminResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AdminError::Validation("Hostname cannot be empty".to_string()));
        }

        let key = &self.authentication.jwt_signing_key;
        if key.is_empty() {
            return Err(AdminError::Validation(
                "JWT signing key cannot be empty".to_string(),
            ));
        }
        if is_hmac(self.authentication.jwt_algorithm) && key.len() < 16 {
            return Err(AdminError::Validation(
                "JWT signing key must be at least 16 characters".to_string(),
            ));
        }

        if self.upstream.request_timeout_secs == 0 {
            return Err(AdminError::Validation(
                "Upstream timeout must be greater than zero".to_string(),
            ));
        }

        for url in [
            &self.upstream.client_service_url,
            &self.upstream.freelancer_service_url,
            &self.upstream.review_service_url,
            &self.upstream.notification_service_url,
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AdminError::Validation(format!(
                    "Upstream URL must be http(s): {}",
                    url
                )));
            }
        }

        Ok(())
    }

    /// Socket address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.hostname, self.service.port)
    }
}

pub(crate) fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("JWT_SIGNING_KEY", "0123456789abcdef")]))
                .unwrap();

        assert_eq!(config.service.port, 8000);
        assert_eq!(config.authentication.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.upstream.client_service_url, "http://client-service");
        assert_eq!(config.upstream.request_timeout(), Duration::from_secs(5));
        assert!(config.authentication.admin_user_ids.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_signing_key() {
        assert!(ServerConfig::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn test_admin_ids_and_algorithm() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SIGNING_KEY", "0123456789abcdef"),
            ("JWT_ALGORITHM", "HS512"),
            ("ADMIN_USER_IDS", "1, 7,,42"),
        ]))
        .unwrap();

        assert_eq!(config.authentication.jwt_algorithm, Algorithm::HS512);
        assert_eq!(config.authentication.admin_user_ids, vec![1, 7, 42]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SIGNING_KEY", "0123456789abcdef"),
            ("JWT_ALGORITHM", "ROT13"),
        ]))
        .is_err());

        assert!(ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SIGNING_KEY", "0123456789abcdef"),
            ("ADMIN_USER_IDS", "one"),
        ]))
        .is_err());
    }

    #[test]
    fn test_validate_rejects_short_hmac_key() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("JWT_SIGNING_KEY", "short")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_upstream_url() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SIGNING_KEY", "0123456789abcdef"),
            ("REVIEW_SERVICE_URL", "review-service"),
        ]))
        .unwrap();
        assert!(config.validate().is_err());
    }
}
