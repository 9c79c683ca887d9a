//! KVDN REST client.
//!
//! Two read routes are used:
//!
//! - `GET {url}/X/{path}/{key}` answers with the raw stored value
//! - `GET {url}/KEYS/{path}` answers with a JSON array of key names
//!
//! The credential, when present, is sent as a bearer token.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::SecretsClient;
use crate::error::StoreError;

const VALUE_ROUTE: &str = "X";
const KEYS_ROUTE: &str = "KEYS";

/// Blocking HTTP client for a KVDN server.
pub struct KvdnClient {
    base: Url,
    token: Option<Zeroizing<String>>,
    client: Client,
}

impl std::fmt::Debug for KvdnClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvdnClient")
            .field("base", &self.base.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl KvdnClient {
    /// Connect to the KVDN server at `url`.
    ///
    /// No request is made here; connectivity problems surface on first use.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if `url` is not a usable base URL or
    /// the HTTP client can't be built.
    pub fn new(
        url: &str,
        token: Option<Zeroizing<String>>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let base = Url::parse(url)
            .map_err(|e| StoreError::Connection(format!("invalid url '{}': {}", url, e)))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Connection(format!(
                "invalid url '{}': not a base url",
                url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Connection(format!("failed to build HTTP client: {}", e)))?;

        debug!(url = %base, authenticated = token.is_some(), "kvdn client ready");
        Ok(Self {
            base,
            token,
            client,
        })
    }

    /// Build `{base}/{route}/{path...}/{key}` with each segment escaped.
    fn endpoint(&self, route: &str, path: &str, key: Option<&str>) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::Connection(format!("invalid base url '{}'", self.base)))?;
            segments.pop_if_empty().push(route);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if let Some(key) = key {
                segments.push(key);
            }
        }
        Ok(url)
    }

    fn fetch(&self, url: Url) -> Result<Response, StoreError> {
        debug!(url = %url, "kvdn request");
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.as_str());
        }
        request
            .send()
            .map_err(|e| StoreError::Connection(format!("kvdn request failed: {}", e)))
    }

    fn read_body(response: Response) -> Result<String, StoreError> {
        response
            .text()
            .map_err(|e| StoreError::Decode(format!("failed to read response body: {}", e)))
    }
}

impl SecretsClient for KvdnClient {
    fn get(&self, path: &str, key: &str) -> Result<String, StoreError> {
        let response = self.fetch(self.endpoint(VALUE_ROUTE, path, Some(key))?)?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound {
                path: path.to_string(),
                key: key.to_string(),
            }),
            status if status.is_success() => Self::read_body(response),
            status => Err(StoreError::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            }),
        }
    }

    fn list_keys(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let response = self.fetch(self.endpoint(KEYS_ROUTE, path, None)?)?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::PathNotFound(path.to_string())),
            status if status.is_success() => {
                let body = Self::read_body(response)?;
                serde_json::from_str::<Vec<String>>(&body).map_err(|e| {
                    StoreError::Decode(format!("failed to decode key list: {}; body={}", e, body))
                })
            }
            status => Err(StoreError::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "kvdn"
    }
}
