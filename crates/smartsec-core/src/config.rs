// ── Runtime engine configuration ──
//
// These types describe *how* to reach one security account and how
// long fetched status stays fresh. They carry credential data but never
// touch disk: the CLI (via smartsec-config) builds an `EngineConfig`
// and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::CoreError;

/// Default cache time-to-live, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5;

/// Accessory name used when none is configured.
pub const DEFAULT_ACCESSORY_NAME: &str = "Security System";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default for hosted portals.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed test portals).
    DangerAcceptInvalid,
}

/// Configuration for one security account.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Accessory display name.
    pub name: String,
    /// Portal domain (`portal.example.com`) or full base URL.
    pub domain: String,
    pub username: String,
    pub password: SecretString,
    /// How long a fetched snapshot stays cached. Expiry drives the next poll.
    pub cache_ttl: Duration,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl EngineConfig {
    pub fn new(
        domain: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            name: DEFAULT_ACCESSORY_NAME.into(),
            domain: domain.into(),
            username: username.into(),
            password,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the cache TTL from a whole number of seconds.
    #[must_use]
    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl = Duration::from_secs(secs);
        self
    }

    /// Reject configurations the engine cannot start with.
    ///
    /// Username, password and domain are required; the TTL must be
    /// non-zero or the polling loop would spin.
    pub fn validate(&self) -> Result<(), CoreError> {
        let missing = [
            ("username", self.username.trim().is_empty()),
            ("password", self.password.expose_secret().is_empty()),
            ("domain", self.domain.trim().is_empty()),
        ];
        if let Some((field, _)) = missing.iter().find(|(_, empty)| *empty) {
            return Err(CoreError::Config {
                message: format!("missing required parameter '{field}'"),
            });
        }
        if self.cache_ttl.is_zero() {
            return Err(CoreError::Config {
                message: "cache TTL must be at least one second".into(),
            });
        }
        Ok(())
    }
}
