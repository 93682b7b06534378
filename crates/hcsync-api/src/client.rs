// Hub HTTP client
//
// Wraps `reqwest::Client` with hub-specific URL construction, basic-auth
// injection and status/body decoding. Endpoint modules (devices, refresh)
// are implemented as inherent methods in separate files to keep this
// module focused on transport mechanics.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::{Credentials, preview};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the hub REST API.
///
/// All methods return decoded payloads; non-success status codes and
/// malformed bodies are mapped to [`Error`] before the caller sees them.
#[derive(Debug, Clone)]
pub struct HubClient {
    http: reqwest::Client,
    base_url: Url,
    /// Basic-auth credentials, set by [`login`](Self::login).
    credentials: Option<Credentials>,
}

impl HubClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// The `base_url` is the hub root (e.g. `http://styx.fibaro.com:7777`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            credentials: None,
        }
    }

    /// The hub base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether credentials are currently attached to outgoing requests.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    pub(crate) fn clear_credentials(&mut self) {
        self.credentials = None;
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/api/{path}");
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET request and return the raw response.
    pub(crate) async fn send_get(&self, url: Url) -> Result<reqwest::Response, Error> {
        debug!("GET {}", url);

        let builder = self.http.get(url);
        let builder = match &self.credentials {
            Some(credentials) => credentials.apply(builder),
            None => builder,
        };

        builder.send().await.map_err(Error::Transport)
    }

    /// Send an authenticated GET request and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let resp = self.send_get(url).await?;
        Self::parse_body(resp).await
    }

    /// Map the status code, then decode the body as `T`.
    async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("credentials rejected (HTTP {status})"),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }
}
