//! 8x8 Chat Apps HTTP client.
//!
//! One call per dispatch, no retry, no idempotency key. Any non-2xx response
//! or transport failure becomes a [`DeliveryError`].

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::message::{BatchRequest, OutgoingMessage};
use crate::config::EightByEightConfig;
use crate::error::{BridgeError, DeliveryError, Result};

/// Status and body returned by 8x8 for an accepted request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Clone)]
pub struct ChatAppsClient {
    client: Client,
    api_key: String,
    base_url: String,
    sub_account_id: String,
}

impl ChatAppsClient {
    pub fn new(config: &EightByEightConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &EightByEightConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sub_account_id: config.sub_account_id.clone(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.base_url, self.sub_account_id)
    }

    /// Send one message to `msisdn`.
    pub async fn send_single(&self, msisdn: &str, message: &OutgoingMessage) -> Result<ProviderResponse> {
        debug!(kind = message.content.kind(), "sending single message");
        self.post(&self.messages_url(), &message.to_wire(msisdn)).await
    }

    /// Send all `messages` to `msisdn` in one batch call, preserving order.
    pub async fn send_batch(
        &self,
        msisdn: &str,
        messages: &[OutgoingMessage],
    ) -> Result<ProviderResponse> {
        debug!(count = messages.len(), "sending batch");
        let body = BatchRequest {
            messages: messages.iter().map(|m| m.to_wire(msisdn)).collect(),
        };
        self.post(&format!("{}/batch", self.messages_url()), &body)
            .await
    }

    /// Pick single or batch delivery by count. Nothing to send is an error
    /// and makes no call.
    pub async fn dispatch(&self, msisdn: &str, messages: &[OutgoingMessage]) -> Result<ProviderResponse> {
        match messages {
            [] => Err(BridgeError::MissingChannelOutput(
                "no output classified for delivery".to_string(),
            )),
            [single] => self.send_single(msisdn, single).await,
            many => self.send_batch(msisdn, many).await,
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<ProviderResponse> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let reason = e.to_string();
                crate::log_component!(
                    error,
                    "outbound",
                    "8x8 request failed",
                    url = url,
                    reason = reason.as_str()
                );
                DeliveryError::transport(format!("8x8 request failed: {}", reason))
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            crate::log_component!(
                error,
                "outbound",
                "failed to read 8x8 response",
                url = url,
                status = status
            );
            DeliveryError::transport(format!(
                "failed to read 8x8 response body (HTTP {}): {}",
                status, e
            ))
        })?;
        let parsed = serde_json::from_str::<Value>(&text).ok();

        if !(200..300).contains(&status) {
            let err = DeliveryError::from_response(status, parsed);
            error!(
                url,
                status,
                body = %err.body.as_ref().map(serde_json::Value::to_string).unwrap_or(text),
                "8x8 rejected message"
            );
            if err.is_auth() {
                warn!("8x8 refused the credentials; check eightbyeight.api_key and sub_account_id");
            } else if err.is_client_error() {
                warn!("8x8 refused the request; the message is not retryable as sent");
            }
            return Err(err.into());
        }

        crate::log_component!(info, "outbound", "8x8 accepted message", status = status);
        Ok(ProviderResponse {
            status,
            body: parsed.unwrap_or(Value::Null),
        })
    }
}
