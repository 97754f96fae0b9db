//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use smartsec_config::ConfigError;
use smartsec_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_READY: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not fetch status from the portal")]
    #[diagnostic(
        code(smartsec::connection_failed),
        help(
            "Check that the portal domain is correct and reachable.\n\
             Reason: {message}"
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed")]
    #[diagnostic(
        code(smartsec::auth_failed),
        help(
            "Verify the username and password for this account.\n\
             Reason: {message}\n\
             Run: smartsec config set-password"
        )
    )]
    AuthFailed { message: String },

    // ── Policy ───────────────────────────────────────────────────────

    #[error("Can't set {target}: system is not ready")]
    #[diagnostic(
        code(smartsec::not_ready),
        help(
            "The panel reports a triggered alarm with an active fault.\n\
             Clear the fault at the panel, then try again."
        )
    )]
    NotReady { target: String },

    #[error("State change rejected: {message}")]
    #[diagnostic(code(smartsec::rejected))]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(smartsec::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Missing required parameter '{field}'")]
    #[diagnostic(
        code(smartsec::missing_parameter),
        help(
            "Set it in profile '{profile}', pass it as a flag, or export SMARTSEC_{env}.\n\
             Create a profile with: smartsec config init"
        )
    )]
    MissingField {
        field: String,
        profile: String,
        env: String,
    },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(smartsec::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: smartsec config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(smartsec::no_config),
        help(
            "Create one with: smartsec config init\n\
             Expected at: {path}\n\
             Or pass --domain, --username and --password."
        )
    )]
    NoConfig { path: String },

    #[error("Failed to load configuration: {message}")]
    #[diagnostic(code(smartsec::config))]
    Config { message: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Timed out after {seconds}s")]
    #[diagnostic(
        code(smartsec::timeout),
        help("Increase the wait with --timeout or --wait, or check the portal status.")
    )]
    Timeout { seconds: u64 },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotReady { .. } => exit_code::NOT_READY,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::MissingField { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config { .. } => exit_code::USAGE,
            Self::Rejected { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Fetch { message } => CliError::ConnectionFailed { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotReady { target } => CliError::NotReady {
                target: target.to_string(),
            },

            CoreError::Rejected { message } => CliError::Rejected { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },

            ConfigError::MissingField { profile, field } => CliError::MissingField {
                env: field.to_uppercase(),
                field: field.into(),
                profile,
            },

            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },

            ConfigError::Keyring(reason) => CliError::Validation {
                field: "keyring".into(),
                reason,
            },

            ConfigError::Io(e) => CliError::Io(e),

            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => {
                CliError::Config {
                    message: other.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use smartsec_core::TargetState;

    use super::*;

    #[test]
    fn not_ready_maps_to_exit_six() {
        let err = CliError::from(CoreError::NotReady {
            target: TargetState::ArmedStay,
        });
        assert_eq!(err.exit_code(), exit_code::NOT_READY);
        assert_eq!(err.to_string(), "Can't set armed_stay: system is not ready");
    }

    #[test]
    fn fetch_failure_is_connection_error() {
        let err = CliError::from(CoreError::Fetch {
            message: "HTTP 502".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn missing_field_names_env_var() {
        let err = CliError::from(ConfigError::MissingField {
            profile: "default".into(),
            field: "password",
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert!(matches!(err, CliError::MissingField { ref env, .. } if env == "PASSWORD"));
    }
}
