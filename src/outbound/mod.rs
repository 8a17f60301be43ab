//! Outbound path: AI output classification, 8x8 wire model, and delivery.

pub mod client;
pub mod formatter;
pub mod message;

pub use client::{ChatAppsClient, ProviderResponse};
pub use formatter::{first_text, Formatter, MAX_BUTTONS};
pub use message::{Interactive, MessageContent, OutgoingMessage};
