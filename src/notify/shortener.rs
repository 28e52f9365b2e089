//! URL shortening over a goo.gl-style JSON API.
//!
//! `POST {endpoint}[?key=API_KEY]` with `{"longUrl": "..."}`, answered by
//! `{"id": "<short url>"}`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::ShortenerConfig;
use crate::notify::{NotifyError, UrlShortener};

const STAGE: &str = "shorten";

#[derive(Debug, Clone)]
pub struct HttpShortener {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ShortenResponse {
    id: Option<String>,
}

impl HttpShortener {
    pub fn new(client: reqwest::Client, config: &ShortenerConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl UrlShortener for HttpShortener {
    async fn shorten(&self, url: &str) -> Result<String, NotifyError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "longUrl": url }));
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request
            .send()
            .await
            .map_err(|source| NotifyError::Http { stage: STAGE, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status { stage: STAGE, status });
        }

        let body: ShortenResponse = response
            .json()
            .await
            .map_err(|source| NotifyError::Http { stage: STAGE, source })?;

        body.id.ok_or(NotifyError::MissingField {
            stage: STAGE,
            field: "id",
        })
    }
}
