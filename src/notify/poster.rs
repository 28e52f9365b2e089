//! Status posting to a social/notification webhook.

use async_trait::async_trait;
use serde_json::json;

use crate::config::PosterConfig;
use crate::notify::{NotifyError, StatusPoster};

const STAGE: &str = "post";

#[derive(Debug, Clone)]
pub struct WebhookPoster {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl WebhookPoster {
    pub fn new(client: reqwest::Client, config: &PosterConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl StatusPoster for WebhookPoster {
    async fn post(&self, message: &str) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "status": message }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|source| NotifyError::Http { stage: STAGE, source })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status { stage: STAGE, status })
        }
    }
}
