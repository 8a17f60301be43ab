//! AI platform execution.
//!
//! The gateway hands each normalized input to an [`Executor`] and delivers
//! whatever outputs come back. [`CognigyEndpoint`] calls the platform's REST
//! endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::CognigyConfig;
use crate::error::{BridgeError, Result};
use crate::inbound::NormalizedInput;

/// Outputs produced by one execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedOutput {
    #[serde(default)]
    pub output_stack: Vec<Value>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, input: &NormalizedInput) -> Result<ProcessedOutput>;
}

/// REST endpoint of the AI platform.
pub struct CognigyEndpoint {
    client: Client,
    url: String,
}

impl CognigyEndpoint {
    pub fn new(config: &CognigyConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.endpoint_url.clone(),
        }
    }
}

#[async_trait]
impl Executor for CognigyEndpoint {
    async fn execute(&self, input: &NormalizedInput) -> Result<ProcessedOutput> {
        let response = self
            .client
            .post(&self.url)
            .json(input)
            .send()
            .await
            .map_err(|e| BridgeError::Executor(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "failed to read endpoint error body");
                    String::new()
                }
            };
            return Err(BridgeError::Executor(format!(
                "endpoint returned {}: {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BridgeError::Executor(format!("invalid response body: {}", e)))?;
        if body.get("outputStack").is_none() {
            warn!("endpoint response has no outputStack, treating as empty");
        }
        let processed: ProcessedOutput = serde_json::from_value(body)?;
        debug!(outputs = processed.output_stack.len(), "execution finished");
        Ok(processed)
    }
}
