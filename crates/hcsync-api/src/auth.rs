// Hub authentication
//
// The hub has no login endpoint: every request carries HTTP basic auth.
// `login` stores the credentials and probes `/api/devices` to find out
// whether the hub accepts them.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::HubClient;
use crate::error::Error;

/// Basic-auth credentials attached to every hub request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Attach these credentials to a request builder.
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.username, Some(self.password.expose_secret()))
    }
}

impl HubClient {
    /// Authenticate with the hub using username/password.
    ///
    /// `GET /api/devices` is used as the probe. Any non-success status is
    /// reported as [`Error::Authentication`] and the credentials are
    /// dropped again; connection failures surface as [`Error::Transport`].
    pub async fn login(&mut self, username: &str, password: &SecretString) -> Result<(), Error> {
        self.set_credentials(Credentials::new(username, password.clone()));

        let url = self.api_url("devices")?;
        debug!("probing credentials at {}", url);

        let resp = match self.send_get(url).await {
            Ok(resp) => resp,
            Err(e) => {
                self.clear_credentials();
                return Err(e);
            }
        };

        let status = resp.status();
        if !status.is_success() {
            self.clear_credentials();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        debug!("login successful");
        Ok(())
    }
}

/// First 200 characters of a body, for error messages.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
