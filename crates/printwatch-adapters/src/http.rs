//! Shared HTTP/JSON plumbing for the network backends.

use std::sync::Arc;
use std::time::Duration;

use printwatch_core::{ConfigError, FetchError};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::credentials::CredentialStore;

/// Per-request transport deadline applied by the HTTP client.
pub const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// How a request proves who it is. Secrets are referenced by key and looked
/// up at send time, never stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    None,
    /// `X-Api-Key: <secret>` (PrusaLink, OctoPrint).
    ApiKey { credential_key: String },
    /// HTTP Basic with `username` and the secret.
    Basic {
        username: String,
        credential_key: String,
    },
    /// `Authorization: Bearer <secret>` (PrusaConnect).
    Bearer { credential_key: String },
}

// ─── Error classification ─────────────────────────────────────────

/// Maps transport-level reqwest failures onto [`FetchError`].
pub trait ReqwestErrorExt {
    fn into_fetch_error(self, timeout: Duration) -> FetchError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_fetch_error(self, timeout: Duration) -> FetchError {
        if self.is_timeout() {
            FetchError::Timeout(timeout)
        } else if self.is_decode() {
            FetchError::Parse(describe(&self.without_url()))
        } else {
            // Connect errors and everything else mean the device was not reached.
            FetchError::Transport(describe(&self.without_url()))
        }
    }
}

/// Error message plus its source chain, e.g.
/// `error sending request: tcp connect error: Connection refused`.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.ends_with(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}

// ─── Client ───────────────────────────────────────────────────────

/// GETs JSON documents from one printer and classifies every outcome.
pub struct HttpJsonClient {
    client: Client,
    base_url: String,
    auth: AuthScheme,
    credentials: Arc<dyn CredentialStore>,
    timeout: Duration,
}

impl HttpJsonClient {
    pub fn new(
        base_url: &str,
        auth: AuthScheme,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        Self::with_timeout(base_url, auth, credentials, TRANSPORT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        auth: AuthScheme,
        credentials: Arc<dyn CredentialStore>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            credentials,
            timeout,
        })
    }

    /// GET `base_url + path` and decode the body as `T`.
    ///
    /// 401/403 become [`FetchError::Auth`], other non-2xx statuses
    /// [`FetchError::Http`], undecodable bodies [`FetchError::Parse`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "requesting printer status");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| e.into_fetch_error(self.timeout))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| e.into_fetch_error(self.timeout))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            AuthScheme::None => request,
            AuthScheme::ApiKey { credential_key } => match self.lookup(credential_key) {
                Some(secret) => request.header("X-Api-Key", secret),
                None => request,
            },
            AuthScheme::Basic {
                username,
                credential_key,
            } => match self.lookup(credential_key) {
                Some(secret) => request.basic_auth(username, Some(secret)),
                None => request,
            },
            AuthScheme::Bearer { credential_key } => match self.lookup(credential_key) {
                Some(secret) => request.bearer_auth(secret),
                None => request,
            },
        }
    }

    fn lookup(&self, credential_key: &str) -> Option<String> {
        let secret = self.credentials.secret(credential_key);
        if secret.is_none() {
            tracing::warn!(
                credential_key,
                "no secret stored for credential key, sending request without auth"
            );
        }
        secret
    }
}

impl std::fmt::Debug for HttpJsonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpJsonClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
