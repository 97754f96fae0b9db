// ── Core error types ──
//
// User-facing errors from smartsec-core. Consumers never see HTTP
// status codes or JSON parse failures directly: the
// `From<smartsec_api::Error>` impl folds transport-layer errors into
// engine-level variants.

use thiserror::Error;

use crate::model::TargetState;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Session ──────────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Status retrieval ─────────────────────────────────────────────
    #[error("Failed to fetch status: {message}")]
    Fetch { message: String },

    #[error("Timed out after {timeout_secs}s waiting for status")]
    Timeout { timeout_secs: u64 },

    // ── Policy ───────────────────────────────────────────────────────
    /// The arm request was refused before reaching the device.
    #[error("Can't set {target}: system is not ready")]
    NotReady { target: TargetState },

    // ── Device commands ──────────────────────────────────────────────
    #[error("State change rejected by device: {message}")]
    Rejected { message: String },
}

impl CoreError {
    /// Whether this is the not-ready policy rejection.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<smartsec_api::Error> for CoreError {
    fn from(err: smartsec_api::Error) -> Self {
        match err {
            smartsec_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            smartsec_api::Error::SessionExpired => CoreError::Fetch {
                message: "session expired -- re-authentication required".into(),
            },
            smartsec_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid portal URL: {e}"),
            },
            smartsec_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            smartsec_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            smartsec_api::Error::Transport(ref e) => CoreError::Fetch {
                message: e.to_string(),
            },
            smartsec_api::Error::Portal { status, message } => CoreError::Fetch {
                message: format!("portal returned HTTP {status}: {message}"),
            },
            smartsec_api::Error::Deserialization { message, body: _ } => CoreError::Fetch {
                message: format!("unreadable status payload: {message}"),
            },
        }
    }
}
