// ── Device client seam ──
//
// The engine talks to the remote panel only through `DeviceClient`.
// `PortalDevice` is the production implementation over the portal's
// JSON session API; tests substitute scripted clients.

use std::future::Future;

use secrecy::SecretString;
use tracing::debug;

use smartsec_api::transport::{TlsMode, TransportConfig};
use smartsec_api::{PortalClient, portal_url};

use crate::config::{EngineConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{StatusSnapshot, TargetState};

/// Session-authenticated access to one security panel.
///
/// Implementations own their session: `login` (re)establishes it and the
/// other calls assume it is live. Any failure from `current_status` is
/// treated by the engine as a possibly expired session.
pub trait DeviceClient: Send + Sync + 'static {
    /// Authenticate, replacing any previous session.
    fn login(&self) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Fetch the panel's current status.
    fn current_status(&self) -> impl Future<Output = Result<StatusSnapshot, CoreError>> + Send;

    /// Ask the panel to move to `target`. Acceptance says nothing about
    /// the eventual outcome; that shows up in a later status fetch.
    fn change_state(
        &self,
        target: TargetState,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// End the session. Best-effort; the default does nothing.
    fn logout(&self) -> impl Future<Output = Result<(), CoreError>> + Send {
        async { Ok(()) }
    }
}

/// [`DeviceClient`] backed by the portal HTTP API.
pub struct PortalDevice {
    client: PortalClient,
    username: String,
    password: SecretString,
}

impl PortalDevice {
    /// Build a portal client for the account described by `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let base_url = portal_url(&config.domain)?;
        let transport = build_transport(config);
        let client = PortalClient::new(base_url, &transport)?;
        debug!(url = %client.base_url(), "portal client ready");
        Ok(Self::with_client(
            client,
            config.username.clone(),
            config.password.clone(),
        ))
    }

    /// Wrap an existing portal client.
    pub fn with_client(client: PortalClient, username: String, password: SecretString) -> Self {
        Self {
            client,
            username,
            password,
        }
    }
}

impl DeviceClient for PortalDevice {
    async fn login(&self) -> Result<(), CoreError> {
        self.client.login(&self.username, &self.password).await?;
        Ok(())
    }

    async fn current_status(&self) -> Result<StatusSnapshot, CoreError> {
        let status = self.client.current_status().await?;
        StatusSnapshot::try_from(status)
    }

    async fn change_state(&self, target: TargetState) -> Result<(), CoreError> {
        self.client
            .change_state(target.code())
            .await
            .map_err(|e| CoreError::Rejected {
                message: e.to_string(),
            })
    }

    async fn logout(&self) -> Result<(), CoreError> {
        self.client.logout().await?;
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the engine configuration.
fn build_transport(config: &EngineConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        cookie_jar: None, // PortalClient::new adds one automatically
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
