//! chatapps-bridge - connects an AI conversation platform to 8x8 WhatsApp
//!
//! Inbound 8x8 webhooks are normalized (with optional identifier redaction)
//! into the platform's input shape; the platform's output is classified into
//! WhatsApp content and delivered through the 8x8 Chat Apps API.

pub mod config;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod inbound;
pub mod outbound;
pub mod redact;
pub mod session;
pub mod transformer;
pub mod utils;

pub use config::Config;
pub use error::{BridgeError, DeliveryError, Result};
pub use inbound::{InboundNormalizer, InboundOutcome, NormalizedInput};
pub use outbound::{ChatAppsClient, Formatter, MessageContent, OutgoingMessage, ProviderResponse};
pub use redact::{HashAlgorithm, Redactor};
pub use session::{MemorySessionStore, SessionKey, SessionRecord, SessionStore};
pub use transformer::Transformer;

/// Crate version, reported by `/health` and `version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
