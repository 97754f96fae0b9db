// Portal HTTP client
//
// Wraps `reqwest::Client` with portal URL construction, cookie-based
// session login, and status/state endpoints. Session mechanics stay
// here; the engine only sees login / status / change-state.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::cookie::{CookieStore, Jar};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{PortalStatus, StateChangeRequest};
use crate::transport::TransportConfig;

const LOGIN_PATH: &str = "/api/login";
const LOGOUT_PATH: &str = "/api/logout";
const STATUS_PATH: &str = "/api/status";
const STATE_PATH: &str = "/api/state";

/// Derive the portal base URL from an account domain.
///
/// A bare host (`portal.example.com`) becomes `https://portal.example.com`;
/// anything carrying a scheme is parsed as-is. A URL without a host is
/// rejected.
pub fn portal_url(domain: &str) -> Result<Url, Error> {
    let domain = domain.trim();
    let url = if domain.contains("://") {
        Url::parse(domain)?
    } else {
        Url::parse(&format!("https://{}", domain.trim_end_matches('/')))?
    };
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidUrl(url::ParseError::EmptyHost));
    }
    Ok(url)
}

/// Raw HTTP client for the security portal.
///
/// A successful [`login`](Self::login) stores the session cookie in the
/// client's jar; every later request carries it automatically.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
    /// Cookie jar reference for inspecting the session cookie.
    cookie_jar: Option<Arc<Jar>>,
}

impl PortalClient {
    /// Create a new portal client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (session auth requires cookies).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            cookie_jar,
        })
    }

    /// Create a portal client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            cookie_jar: None,
        }
    }

    /// The portal base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the cookie jar currently holds a cookie for the portal.
    ///
    /// Always `false` for clients built via [`with_client`](Self::with_client).
    pub fn has_session(&self) -> bool {
        self.cookie_jar
            .as_ref()
            .and_then(|jar| jar.cookies(&self.base_url))
            .is_some()
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Session ───────────────────────────────────────────────────────

    /// Authenticate with the portal using username/password.
    ///
    /// `POST /api/login` with `{"username": "...", "password": "..."}`
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.url(LOGIN_PATH)?;
        debug!("logging in at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let resp = self.http.post(url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        debug!("login successful");
        Ok(())
    }

    /// End the current session. The response status is ignored.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.url(LOGOUT_PATH)?;
        debug!("logging out at {}", url);
        let _resp = self.http.post(url).send().await?;
        Ok(())
    }

    // ── Alarm endpoints ───────────────────────────────────────────────

    /// Fetch the current alarm status.
    ///
    /// `GET /api/status`
    pub async fn current_status(&self) -> Result<PortalStatus, Error> {
        let url = self.url(STATUS_PATH)?;
        debug!("fetching current status");
        let resp = self.http.get(url).send().await?;
        let resp = check_status(resp).await?;
        parse_json(resp).await
    }

    /// Ask the portal to move the alarm to `target_state`.
    ///
    /// `POST /api/state` with `{"targetState": n}`
    pub async fn change_state(&self, target_state: u8) -> Result<(), Error> {
        let url = self.url(STATE_PATH)?;
        debug!(target_state, "requesting state change");
        let resp = self
            .http
            .post(url)
            .json(&StateChangeRequest { target_state })
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}

/// Map non-success responses into typed errors. 401/403 mean the session
/// cookie is gone or was revoked.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::SessionExpired);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(Error::Portal {
        status: status.as_u16(),
        message,
    })
}

async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    trace!(body = %body, "portal response");
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn portal_url_adds_https_to_bare_domain() {
        let url = portal_url("portal.example.com").unwrap();
        assert_eq!(url.as_str(), "https://portal.example.com/");
    }

    #[test]
    fn portal_url_keeps_explicit_scheme() {
        let url = portal_url("http://127.0.0.1:8080/").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn portal_url_drops_trailing_slash_on_bare_domain() {
        let url = portal_url(" portal.example.com/ ").unwrap();
        assert_eq!(url.as_str(), "https://portal.example.com/");
    }

    #[test]
    fn portal_url_rejects_garbage() {
        assert!(portal_url("http://").is_err());
        assert!(portal_url("https://").is_err());
        assert!(portal_url("").is_err());
        assert!(matches!(
            portal_url("unix:///run/portal.sock"),
            Err(Error::InvalidUrl(url::ParseError::EmptyHost))
        ));
    }
}
