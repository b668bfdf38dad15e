//! JSON-over-HTTP transport.

use eq_session::{ProviderError, ProviderResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::HttpConfig;

/// A `reqwest` client bound to one question service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: HttpConfig,
}

impl ApiClient {
    /// Build a client with the configured timeout.
    pub fn new(config: HttpConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// The settings in use.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// POST `body` as JSON to `path` and decode the JSON reply.
    pub async fn post<B, R>(&self, path: &str, body: &B) -> ProviderResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        tracing::debug!(%url, "POST");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "request refused");
            return Err(ProviderError::Status(status.as_u16()));
        }
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            let ms = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
            ProviderError::Timeout(ms)
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}
