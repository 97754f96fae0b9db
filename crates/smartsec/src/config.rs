//! CLI configuration: thin wrapper around `smartsec_config` shared types.
//!
//! Adds CLI-specific resolution that respects `GlobalOpts` flag
//! overrides (--domain, --username, --password, etc.).

use secrecy::SecretString;

use smartsec_core::EngineConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use smartsec_config::{
    Config, Defaults, Profile, config_path, load_config, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build an `EngineConfig` from the config file, profile, and CLI overrides.
pub fn resolve_engine_config(global: &GlobalOpts) -> Result<EngineConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let base = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                available: available_profiles(&cfg),
                name: profile_name,
            });
        }
        // No profile: flags / env vars must supply everything.
        None if global.domain.is_none() => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        None => Profile::default(),
    };

    let profile = apply_overrides(base, global);

    let password = match global.password {
        Some(ref pw) => SecretString::from(pw.clone()),
        None => smartsec_config::resolve_password(&profile, &profile_name)?,
    };

    Ok(smartsec_config::build_engine_config(
        &profile,
        &profile_name,
        &cfg.defaults,
        password,
    )?)
}

/// Layer CLI flag values over a profile (flag > env > profile).
fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref domain) = global.domain {
        profile.domain.clone_from(domain);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if let Some(ttl) = global.cache_ttl {
        profile.cache_ttl_secs = Some(ttl);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    profile
}
