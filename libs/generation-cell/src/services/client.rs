use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::models::{GenerationError, GenerationRequest, GenerationResponse};

/// Narrow seam to the external text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<Value, GenerationError>;
}

pub struct HttpTextGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl HttpTextGenerator {
    pub fn new(config: &AppConfig) -> Self {
        let timeout_secs = config.generation_timeout_secs;
        let client = match Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build generation client with timeout: {}", e);
                Client::new()
            }
        };

        Self {
            client,
            base_url: config.generation_api_url.trim_end_matches('/').to_string(),
            api_key: config.generation_api_key.clone(),
            model: config.generation_model.clone(),
            timeout_secs,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<Value, GenerationError> {
        if !self.is_configured() {
            return Err(GenerationError::NotConfigured);
        }

        let url = format!("{}/v1/generate", self.base_url);
        debug!("Requesting '{}' generation from {}", request.task, url);

        let body = json!({
            "model": self.model,
            "task": request.task,
            "instructions": request.instructions,
            "context": request.context,
        });

        let mut req = self.client.post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&body);

        if !self.api_key.is_empty() {
            req = req.header(AUTHORIZATION, format!("Bearer {}", self.api_key));
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.timeout_secs)
            } else {
                GenerationError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Generation API error ({}): {}", status, message);
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerationResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.timeout_secs)
            } else {
                GenerationError::InvalidOutput(e.to_string())
            }
        })?;

        match parsed.output {
            Some(output @ Value::Object(_)) => Ok(output),
            Some(other) => Err(GenerationError::InvalidOutput(format!(
                "expected a JSON object, got {}",
                other
            ))),
            None => Err(GenerationError::InvalidOutput("missing 'output' field".to_string())),
        }
    }
}
