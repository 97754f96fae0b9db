//! Shared configuration for smartsec.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `smartsec_core::EngineConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use smartsec_core::{DEFAULT_CACHE_TTL_SECS, EngineConfig, TlsVerification};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "smartsec";

/// Environment prefix for config overrides (`SMARTSEC_DEFAULTS__OUTPUT=json`).
const ENV_PREFIX: &str = "SMARTSEC_";

/// Env vars under the prefix that are read directly, not merged.
const ENV_IGNORED: &[&str] = &["password", "username", "domain", "profile", "config"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("missing required parameter '{field}' for profile '{profile}'")]
    MissingField { profile: String, field: &'static str },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Pick `name`, or the default profile when `None`.
    pub fn profile<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name, p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Seconds a fetched status stays cached.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            cache_ttl_secs: default_cache_ttl(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}
fn default_timeout() -> u64 {
    30
}

/// A named security account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Accessory display name.
    pub name: Option<String>,

    /// Portal domain or full base URL.
    #[serde(default)]
    pub domain: String,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override cache TTL, in seconds.
    pub cache_ttl_secs: Option<u64>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification.
    pub insecure: Option<bool>,

    /// Override request timeout, in seconds.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `SMARTSEC_CONFIG` if set, otherwise
/// XDG / platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("SMARTSEC_CONFIG") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "smartsec", "smartsec").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("smartsec");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// A missing file is not an error: defaults and env still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(ENV_IGNORED).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write to `path`, creating parent dirs.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_key(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

fn keyring_lookup(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))
        .ok()?
        .get_password()
        .ok()
}

/// Store a profile password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))
        .and_then(|entry| entry.set_password(password.expose_secret()))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve the username: profile first, then `SMARTSEC_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| std::env::var("SMARTSEC_USERNAME").ok())
        .ok_or_else(|| ConfigError::MissingField {
            profile: profile_name.into(),
            field: "username",
        })
}

/// Resolve the password from the credential chain:
/// `password_env` → `SMARTSEC_PASSWORD` → keyring → plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(profile, profile_name, keyring_lookup)
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(val) = std::env::var("SMARTSEC_PASSWORD") {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Some(secret) = keyring(profile_name) {
        return Ok(SecretString::from(secret));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::MissingField {
        profile: profile_name.into(),
        field: "password",
    })
}

/// Build an `EngineConfig` from a profile with an already-resolved password.
pub fn build_engine_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    password: SecretString,
) -> Result<EngineConfig, ConfigError> {
    if profile.domain.trim().is_empty() {
        return Err(ConfigError::MissingField {
            profile: profile_name.into(),
            field: "domain",
        });
    }
    let username = resolve_username(profile, profile_name)?;

    let cache_ttl_secs = profile.cache_ttl_secs.unwrap_or(defaults.cache_ttl_secs);
    if cache_ttl_secs == 0 {
        return Err(ConfigError::Validation {
            field: "cache_ttl_secs".into(),
            reason: "must be at least 1".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = EngineConfig::new(profile.domain.clone(), username, password)
        .with_cache_ttl_secs(cache_ttl_secs);
    if let Some(ref name) = profile.name {
        config.name.clone_from(name);
    }
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(config)
}
