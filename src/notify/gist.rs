//! GitHub Gist storage for error payloads.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::GistConfig;
use crate::notify::{NotifyError, PasteStore};

const STAGE: &str = "gist";

#[derive(Debug, Clone)]
pub struct GistStore {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct GistResponse {
    html_url: Option<String>,
}

impl GistStore {
    pub fn new(client: reqwest::Client, config: &GistConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl PasteStore for GistStore {
    async fn store(&self, contents: &str, description: &str) -> Result<String, NotifyError> {
        let body = json!({
            "description": description,
            "public": false,
            "files": {
                "log": { "content": contents }
            }
        });

        let mut request = self
            .client
            .post(format!("{}/gists", self.api_url))
            .header("Accept", "application/vnd.github+json")
            .json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|source| NotifyError::Http { stage: STAGE, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status { stage: STAGE, status });
        }

        let gist: GistResponse = response
            .json()
            .await
            .map_err(|source| NotifyError::Http { stage: STAGE, source })?;

        gist.html_url.ok_or(NotifyError::MissingField {
            stage: STAGE,
            field: "html_url",
        })
    }
}
