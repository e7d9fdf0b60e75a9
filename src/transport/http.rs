//! HTTP transport over reqwest.
//!
//! Each call races the request against its cancellation token: a fired
//! token drops the in-flight request (aborting the connection attempt) and
//! resolves `Cancelled`, so a response that lands after cancellation is
//! never delivered to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::profile::{Profile, ProfileSection, ProgressSummary, SectionId, SectionStatus};

use super::{PhotoUpload, ProfileTransport, TransportError};

/// reqwest-backed [`ProfileTransport`].
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    /// Build a transport from the client config. The reqwest timeout acts
    /// as the hard upper bound above the simulated delays.
    pub fn new(config: &SyncConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Race `request` against `cancel`, then interpret the response.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<T, TransportError> {
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = request.send() => result.map_err(classify_reqwest)?,
        };

        // The token can fire between send-completion and body read; the
        // response must still not be delivered.
        tokio::select! {
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = interpret::<T>(response) => result,
        }
    }
}

fn classify_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

/// 2xx → decode the body; anything else → `Http` with the server's
/// `{error}` message ("Unknown error" when the body is malformed).
async fn interpret<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("error").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(TransportError::Http { status: status.as_u16(), message });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl ProfileTransport for HttpTransport {
    async fn fetch_profile(&self, cancel: &CancellationToken) -> Result<Profile, TransportError> {
        let request = self.client.get(self.url("/profile"));
        self.execute(request, cancel).await
    }

    async fn fetch_progress(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ProgressSummary, TransportError> {
        let request = self.client.get(self.url("/profile/progress"));
        self.execute(request, cancel).await
    }

    async fn update_section(
        &self,
        id: SectionId,
        status: SectionStatus,
        data: Option<Map<String, Value>>,
        cancel: &CancellationToken,
    ) -> Result<ProfileSection, TransportError> {
        let mut body = json!({ "status": status });
        if let Some(data) = data {
            body["data"] = Value::Object(data);
        }
        let request = self
            .client
            .put(self.url(&format!("/profile/sections/{id}")))
            .json(&body);
        self.execute(request, cancel).await
    }

    async fn upload_photo(
        &self,
        photo_uri: &str,
        cancel: &CancellationToken,
    ) -> Result<PhotoUpload, TransportError> {
        let request = self
            .client
            .put(self.url("/profile/photo"))
            .json(&json!({ "photoUri": photo_uri }));
        self.execute(request, cancel).await
    }
}
