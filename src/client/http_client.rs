//! HTTP client for D+ server communication
//!
//! All controller traffic goes through this client: surrounding queries
//! against the hierarchical object store, batched state queries, and the
//! SOAP-like command gateway. Requests carry the session token from
//! [`SessionManager`]; a rejected token triggers exactly one re-login
//! before the failure is surfaced.

use crate::client::{
    parse, session::SessionManager, DeviceState, SurroundingNode, SurroundingResponse,
    COMMAND_PATH, STATE_QUERY_PATH, SURROUNDING_PATH,
};
use crate::config::{credentials::DplusCredentials, DplusConfig};
use crate::error::{DplusError, Result};
use indexmap::IndexMap;
use reqwest::{header::CONTENT_TYPE, Client, ClientBuilder, RequestBuilder, Response};
use tracing::{debug, info, warn};
use url::Url;

/// HTTP client for a D+ server
pub struct DplusHttpClient {
    http: Client,
    base_url: Url,
    session: SessionManager,
}

impl DplusHttpClient {
    /// Create a new HTTP client
    pub fn new(config: DplusConfig, credentials: DplusCredentials) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(format!("divus-dplus-rust/{}", env!("CARGO_PKG_VERSION")));

        if !config.verify_ssl {
            warn!("SSL verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| DplusError::connection(format!("Failed to build HTTP client: {e}")))?;

        let session = SessionManager::new(http.clone(), config.url.clone(), credentials);

        Ok(Self {
            http,
            base_url: config.url,
            session,
        })
    }

    /// Build URL for an API endpoint
    fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DplusError::connection(format!("Invalid URL path {path}: {e}")))
    }

    /// Send a session-authenticated request, re-logging in once when the
    /// controller rejects the cached token.
    async fn send_with_session<B>(&self, mut build: B) -> Result<Response>
    where
        B: FnMut(&str) -> RequestBuilder,
    {
        let mut refreshed = false;

        loop {
            let session_id = self.session.session_id().await?;
            let response = build(&session_id).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();

            if matches!(status.as_u16(), 401 | 403) && !refreshed {
                debug!("session rejected by controller, re-authenticating");
                self.session.invalidate().await;
                refreshed = true;
                continue;
            }

            return Err(match status.as_u16() {
                401 | 403 => {
                    DplusError::authentication(format!("HTTP {status}: {body}"))
                }
                500..=599 => DplusError::connection(format!("Server error {status}: {body}")),
                _ => DplusError::connection(format!("HTTP error {status}: {body}")),
            });
        }
    }

    /// Fetch the children of one surrounding node.
    ///
    /// The returned map preserves the controller's `ORDER_NUM,ID`
    /// ordering. No caching: every call is one round trip.
    pub async fn fetch_surrounding(
        &self,
        surrounding_id: &str,
    ) -> Result<IndexMap<String, SurroundingNode>> {
        let url = self.build_url(SURROUNDING_PATH)?;

        let response = self
            .send_with_session(|session_id| {
                self.http.post(url.clone()).form(&[
                    ("ids", surrounding_id),
                    ("filter", ""),
                    ("order", "ORDER_NUM,ID"),
                    ("limit", ""),
                    ("context", "runtime"),
                    ("sessionId", session_id),
                ])
            })
            .await?;

        let text = response.text().await?;
        let parsed: SurroundingResponse = serde_json::from_str(&text).map_err(|e| {
            DplusError::malformed_response(format!(
                "surrounding query for {surrounding_id}: {e}"
            ))
        })?;

        debug!(
            surrounding_id,
            nodes = parsed.get_objs_from_id.data.len(),
            "fetched surrounding"
        );
        Ok(parsed.get_objs_from_id.data)
    }

    /// Fetch current values for a batch of device/sub-element ids in one
    /// round trip.
    ///
    /// An empty id slice and an absent payload both yield an empty list;
    /// neither is an error.
    pub async fn fetch_states(&self, ids: &[String]) -> Result<Vec<DeviceState>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.build_url(STATE_QUERY_PATH)?;
        let filter = format!("ID IN ({})", ids.join(", "));

        let response = self
            .send_with_session(|session_id| {
                self.http.post(url.clone()).form(&[
                    ("args", "ID, CURRENT_VALUE"),
                    ("src", "DPADD_OBJECT"),
                    ("filter", filter.as_str()),
                    ("type", "SELECT"),
                    ("context", "runtime"),
                    ("sessionid", session_id),
                ])
            })
            .await?;

        let text = response.text().await?;

        match parse::xml_element_text(&text, "payload") {
            Some(payload) => {
                let states = parse::parse_state_rows(&payload);
                debug!(requested = ids.len(), returned = states.len(), "fetched states");
                Ok(states)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Send a `SETVALUE` command for a single device or sub-element.
    ///
    /// Returns the controller's raw textual acknowledgment. The
    /// acknowledgment is not validated; callers must not assume success
    /// from a non-empty response.
    pub async fn set_value(&self, device_id: &str, value: &str) -> Result<String> {
        let url = self.build_url(COMMAND_PATH)?;

        let response = self
            .send_with_session(|session_id| {
                let envelope = command_envelope(device_id, value, session_id);
                self.http
                    .post(url.clone())
                    .header(CONTENT_TYPE, "text/xml")
                    .body(envelope)
            })
            .await?;

        info!(device_id, value, "sent SETVALUE command");
        Ok(response.text().await?)
    }
}

/// Render the fixed command envelope understood by the D+ command
/// gateway.
fn command_envelope(device_id: &str, value: &str, session_id: &str) -> String {
    format!(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <service-runonelement xmlns="urn:xmethods-dpadws">
      <payload>{value}</payload>
      <hashcode>NO-HASHCODE</hashcode>
      <optionals>NO-OPTIONALS</optionals>
      <callsource>WEB-DOMUSPAD_SOAP</callsource>
      <sessionid>{session_id}</sessionid>
      <waittime>10</waittime>
      <idobject>{device_id}</idobject>
      <operation>SETVALUE</operation>
    </service-runonelement>
  </soapenv:Body>
</soapenv:Envelope>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_envelope_carries_all_fields() {
        let envelope = command_envelope("10790", "1", "session-1");
        assert!(envelope.contains("<payload>1</payload>"));
        assert!(envelope.contains("<idobject>10790</idobject>"));
        assert!(envelope.contains("<sessionid>session-1</sessionid>"));
        assert!(envelope.contains("<operation>SETVALUE</operation>"));
        assert!(envelope.contains("<hashcode>NO-HASHCODE</hashcode>"));
        assert!(envelope.contains("<waittime>10</waittime>"));
    }
}
