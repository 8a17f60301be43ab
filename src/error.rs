//! Error types for chatapps-bridge
//!
//! This module defines all error types used throughout the bridge.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Delivery Error
// ============================================================================

/// Failure of an outbound call to the 8x8 Chat Apps API.
///
/// Carries whatever diagnostic the provider returned so the caller can log it.
/// `status` is `None` for transport failures (DNS, connect, TLS, read).
#[derive(Debug)]
pub struct DeliveryError {
    /// HTTP status returned by the provider, if a response was received.
    pub status: Option<u16>,
    /// Response body returned by the provider, if it was valid JSON.
    pub body: Option<Value>,
    /// Human-readable summary.
    pub message: String,
}

impl DeliveryError {
    /// Builds a delivery error for a non-success HTTP response.
    pub fn from_response(status: u16, body: Option<Value>) -> Self {
        let detail = body
            .as_ref()
            .and_then(provider_error_detail)
            .unwrap_or_else(|| "no diagnostic body".to_string());
        Self {
            status: Some(status),
            body,
            message: format!("provider returned HTTP {}: {}", status, detail),
        }
    }

    /// Builds a delivery error for a transport-level failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// Returns `true` if the provider rejected our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }

    /// Returns `true` if the provider rejected the request shape.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status, Some(s) if (400..500).contains(&s))
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DeliveryError {}

/// Pulls a short message out of an 8x8 error body.
///
/// 8x8 returns `{"code": ..., "message": "...", "errors": [...]}`; older
/// deployments nest it as `{"error": {"message": "..."}}`.
fn provider_error_detail(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| {
            body.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
}

impl From<DeliveryError> for BridgeError {
    fn from(err: DeliveryError) -> Self {
        BridgeError::Delivery(err)
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Inbound payload lacks the user msisdn or the recipient channel id.
    #[error("Missing userId or sessionId in incoming message")]
    MissingIdentifier,

    /// AI output did not classify into any WhatsApp content kind.
    #[error("Missing 8x8 compatible channel output: {0}")]
    MissingChannelOutput(String),

    /// Outbound call to 8x8 failed.
    #[error("Delivery error: {0}")]
    Delivery(DeliveryError),

    /// Inbound body could not be parsed.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// No clear identifier is stored for a hashed session key.
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// Session store read/write failure.
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration-related errors (invalid config, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// AI platform endpoint failure.
    #[error("Executor error: {0}")]
    Executor(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// HTTP status the gateway answers with when a hook fails with this error.
    pub fn status_code(&self) -> u16 {
        match self {
            BridgeError::MissingIdentifier => 400,
            BridgeError::MalformedEvent(_) => 400,
            // Nothing to send is not the caller's fault; acknowledge it.
            BridgeError::MissingChannelOutput(_) => 200,
            BridgeError::Delivery(_) => 502,
            BridgeError::Executor(_) => 502,
            BridgeError::UnknownSession(_) => 404,
            BridgeError::Session(_)
            | BridgeError::Config(_)
            | BridgeError::Io(_)
            | BridgeError::Json(_) => 500,
        }
    }
}

/// A specialized `Result` type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
