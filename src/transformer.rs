//! Lifecycle hooks tying the inbound and outbound paths together.
//!
//! - [`Transformer::handle_input`]: webhook body to normalized input
//! - [`Transformer::handle_output`]: one AI output (delivered here in webhook mode)
//! - [`Transformer::handle_execution_finished`]: whole output stack (delivered here in rest mode)

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Config, TransformerMode};
use crate::error::{BridgeError, Result};
use crate::executor::ProcessedOutput;
use crate::inbound::{InboundNormalizer, InboundOutcome};
use crate::outbound::{ChatAppsClient, Formatter, ProviderResponse};
use crate::redact::Redactor;
use crate::session::{SessionKey, SessionStore};

pub struct Transformer {
    normalizer: InboundNormalizer,
    formatter: Formatter,
    client: ChatAppsClient,
    store: Arc<dyn SessionStore>,
    redactor: Redactor,
    mode: TransformerMode,
}

/// Clear addressing for a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub msisdn: String,
    pub channel_id: String,
}

impl Transformer {
    pub fn new(config: &Config, store: Arc<dyn SessionStore>) -> Result<Self> {
        let redactor = Redactor::from_config(&config.redaction)?;
        Ok(Self {
            normalizer: InboundNormalizer::new(
                redactor.clone(),
                Arc::clone(&store),
                config.session.timeout_secs,
            ),
            formatter: Formatter::new(&config.formatter),
            client: ChatAppsClient::new(&config.eightbyeight),
            store,
            redactor,
            mode: config.server.mode,
        })
    }

    pub fn mode(&self) -> TransformerMode {
        self.mode
    }

    pub async fn handle_input(&self, body: &[u8]) -> Result<InboundOutcome> {
        self.normalizer.normalize(body).await
    }

    /// Deliver a single output immediately in webhook mode. In rest mode the
    /// output is left for [`Self::handle_execution_finished`] and `None` is
    /// returned.
    pub async fn handle_output(
        &self,
        output: &Value,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<ProviderResponse>> {
        if self.mode == TransformerMode::Rest {
            return Ok(None);
        }
        self.send_output(output, user_id, session_id).await.map(Some)
    }

    /// Classify and deliver one output regardless of mode.
    pub async fn send_output(
        &self,
        output: &Value,
        user_id: &str,
        session_id: &str,
    ) -> Result<ProviderResponse> {
        let dest = self.resolve(user_id, session_id).await?;
        let message = self.formatter.classify(output, &dest.channel_id)?;
        self.client.send_single(&dest.msisdn, &message).await
    }

    /// Deliver the collected stack once in rest mode: one message goes out
    /// as a single send, several as one batch.
    pub async fn handle_execution_finished(
        &self,
        processed: &ProcessedOutput,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<ProviderResponse>> {
        if self.mode == TransformerMode::Webhook {
            return Ok(None);
        }
        let dest = self.resolve(user_id, session_id).await?;
        let messages = self
            .formatter
            .classify_stack(&processed.output_stack, &dest.channel_id);
        if messages.is_empty() {
            warn!(
                outputs = processed.output_stack.len(),
                "Missing 8x8 compatible channel output"
            );
        }
        let response = self.client.dispatch(&dest.msisdn, &messages).await?;
        info!(messages = messages.len(), status = response.status, "delivered");
        Ok(Some(response))
    }

    /// Recover the clear identifiers stored for a working id pair.
    pub async fn resolve(&self, user_id: &str, session_id: &str) -> Result<Destination> {
        let key = SessionKey::new(user_id, session_id);
        let record = self.store.get(&key).await?.unwrap_or_default();

        let msisdn = match record.clear_user_id {
            Some(v) => v,
            None if !self.redactor.hides_user_id() => user_id.to_string(),
            None => return Err(BridgeError::UnknownSession(key.to_string())),
        };
        let channel_id = match record.clear_session_id {
            Some(v) => v,
            None if !self.redactor.hides_session_id() => session_id.to_string(),
            None => return Err(BridgeError::UnknownSession(key.to_string())),
        };
        debug!(session = %key, "resolved destination");
        Ok(Destination { msisdn, channel_id })
    }
}
