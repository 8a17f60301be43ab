//! Inbound webhook normalization.
//!
//! Turns a raw 8x8 Chat Apps webhook body into the `{userId, sessionId, text,
//! data}` record handed to the AI platform, recording the clear identifiers in
//! the session store on the way.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, Result};
use crate::redact::Redactor;
use crate::session::{fetch_or_default, Binding, SessionKey, SessionStore, Touch};

/// The only event type that carries a user message.
pub const INBOUND_MESSAGE_RECEIVED: &str = "inbound_message_received";

// ============================================================================
// Wire types
// ============================================================================

/// Webhook body posted by 8x8.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl InboundEvent {
    pub fn is_actionable(&self) -> bool {
        self.event_type == INBOUND_MESSAGE_RECEIVED
    }

    /// Clear msisdn of the sender. Empty strings count as absent.
    pub fn msisdn(&self) -> Option<&str> {
        non_empty(self.payload.pointer("/user/msisdn"))
    }

    /// Clear 8x8 channel id the message arrived on.
    pub fn channel_id(&self) -> Option<&str> {
        non_empty(self.payload.pointer("/recipient/channelId"))
    }

    /// Message text, if the content carried any.
    pub fn text(&self) -> Option<&str> {
        self.payload.pointer("/content/text").and_then(Value::as_str)
    }
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Record handed to the AI platform for one inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedInput {
    pub user_id: String,
    pub session_id: String,
    pub text: String,
    pub data: Value,
}

/// Result of normalizing one webhook body.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundOutcome {
    /// Not a user message; acknowledge and do nothing.
    Ignored { event_type: String },
    /// A user message ready for execution.
    Accepted(NormalizedInput),
}

// ============================================================================
// Normalizer
// ============================================================================

pub struct InboundNormalizer {
    redactor: Redactor,
    store: Arc<dyn SessionStore>,
    timeout_secs: u64,
}

impl InboundNormalizer {
    pub fn new(redactor: Redactor, store: Arc<dyn SessionStore>, timeout_secs: u64) -> Self {
        Self {
            redactor,
            store,
            timeout_secs,
        }
    }

    /// Parse and normalize a raw webhook body.
    pub async fn normalize(&self, body: &[u8]) -> Result<InboundOutcome> {
        let event: InboundEvent = serde_json::from_slice(body)
            .map_err(|e| BridgeError::MalformedEvent(e.to_string()))?;
        self.normalize_event(event).await
    }

    /// Normalize an already-parsed event.
    pub async fn normalize_event(&self, event: InboundEvent) -> Result<InboundOutcome> {
        if !event.is_actionable() {
            debug!(event_type = %event.event_type, "ignoring non-message event");
            return Ok(InboundOutcome::Ignored {
                event_type: event.event_type,
            });
        }

        let (clear_user, clear_session) = match (event.msisdn(), event.channel_id()) {
            (Some(u), Some(s)) => (u.to_string(), s.to_string()),
            _ => {
                warn!(
                    has_msisdn = event.msisdn().is_some(),
                    has_channel_id = event.channel_id().is_some(),
                    "inbound message without identifiers"
                );
                return Err(BridgeError::MissingIdentifier);
            }
        };

        let key = SessionKey::new(
            self.redactor.user_id(&clear_user),
            self.redactor.session_id(&clear_session),
        );

        let mut record = fetch_or_default(self.store.as_ref(), &key).await?;
        if record.bind(&clear_user, &clear_session) == Binding::Conflict {
            warn!(
                session = %key,
                "session already bound to different clear identifiers, keeping originals"
            );
        }
        let now = chrono::Utc::now().timestamp_millis();
        match record.touch(now, self.timeout_secs) {
            Touch::Started => info!(session = %key, "session started"),
            Touch::Refreshed => info!(session = %key, "session timeout elapsed, refreshed"),
            Touch::Active => {}
        }
        self.store.put(&key, record).await?;

        Ok(InboundOutcome::Accepted(NormalizedInput {
            user_id: key.user_id,
            session_id: key.session_id,
            text: event.text().unwrap_or_default().to_string(),
            data: event.payload,
        }))
    }
}
