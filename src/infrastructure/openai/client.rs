//! Shared HTTP client for the OpenAI REST API.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::errors::OpenAiError;
use super::policy::RequestPolicy;
use crate::domain::models::OpenAiConfig;

/// Authenticated client bound to one base URL.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    policy: RequestPolicy,
}

impl OpenAiClient {
    /// Build a client from configuration. Fails when no API key is available.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, OpenAiError> {
        let api_key = config.resolve_api_key().ok_or(OpenAiError::MissingApiKey)?;
        let policy = RequestPolicy::new(
            config.requests_per_second,
            config.max_retries,
            config.initial_backoff_ms,
            config.max_backoff_ms,
        );
        Self::new(&config.base_url, api_key, config.timeout_secs, policy)
    }

    /// Client for `base_url`; requests go through `policy`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout_secs: u64,
        policy: RequestPolicy,
    ) -> Result<Self, OpenAiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OpenAiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `{base_url}/{path}` and decode the JSON response.
    pub async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, OpenAiError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.policy.execute(|| self.send_once(&url, body)).await
    }

    async fn send_once<Req, Resp>(&self, url: &str, body: &Req) -> Result<Resp, OpenAiError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| OpenAiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(OpenAiError::from_status(status.as_u16(), body));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| OpenAiError::Decode(e.to_string()))
    }
}
