//! Session management for D+ authentication
//!
//! The controller hands out an opaque session token on login; every
//! subsequent call carries it. The token is cached for the lifetime of
//! the instance and only dropped through [`SessionManager::invalidate`],
//! which the HTTP client uses for its single re-login attempt when the
//! controller rejects a cached token.

use crate::client::{parse, LOGIN_PATH};
use crate::config::credentials::DplusCredentials;
use crate::error::{DplusError, Result};
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, error};
use url::Url;

/// Obtains and caches the controller session token
pub struct SessionManager {
    http: Client,
    base_url: Url,
    credentials: DplusCredentials,
    token: RwLock<Option<String>>,
}

impl SessionManager {
    /// Create a new session manager; no login happens until the first
    /// token request.
    pub fn new(http: Client, base_url: Url, credentials: DplusCredentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            token: RwLock::new(None),
        }
    }

    /// Return the cached session token, logging in first if necessary.
    ///
    /// Acquisition is idempotent: after the first success, further calls
    /// return the cached token without touching the controller.
    pub async fn session_id(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }
        self.login().await
    }

    /// Drop the cached token so the next call logs in again.
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    async fn login(&self) -> Result<String> {
        // Double-checked under the write lock: concurrent first callers
        // must issue exactly one login request.
        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }

        let url = self
            .base_url
            .join(LOGIN_PATH)
            .map_err(|e| DplusError::connection(format!("Invalid login URL: {e}")))?;

        let form = [
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("context", "runtime"),
            ("op", "login"),
        ];

        let response = self.http.post(url).form(&form).send().await?;
        let text = response.text().await?;

        match parse::xml_element_text(&text, "sessionid") {
            Some(token) => {
                debug!("login successful");
                *guard = Some(token.clone());
                Ok(token)
            }
            None => {
                error!("login failed: response contained no session token");
                Err(DplusError::authentication(
                    "login response contained no session token",
                ))
            }
        }
    }
}
