//! Configuration type definitions for chatapps-bridge
//!
//! This module defines all configuration structs used by the bridge.
//! All types implement serde traits for JSON serialization and have sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration struct for chatapps-bridge
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// 8x8 Chat Apps credentials and endpoint
    pub eightbyeight: EightByEightConfig,
    /// Identity redaction settings
    pub redaction: RedactionConfig,
    /// Session store settings
    pub session: SessionConfig,
    /// Outbound formatter settings
    pub formatter: FormatterConfig,
    /// AI platform endpoint
    pub cognigy: CognigyConfig,
    /// Gateway HTTP server
    pub server: ServerConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

// ============================================================================
// 8x8 Configuration
// ============================================================================

/// Default 8x8 Chat Apps subaccount API root.
pub const DEFAULT_8X8_BASE_URL: &str = "https://chatapps.8x8.com/api/v1/subaccounts";

/// 8x8 Chat Apps API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EightByEightConfig {
    /// 8x8 Connect API key (sent as a Bearer token)
    pub api_key: String,
    /// 8x8 subaccount id
    pub sub_account_id: String,
    /// API root; `/{sub_account_id}/messages` is appended
    pub base_url: String,
}

impl Default for EightByEightConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            sub_account_id: String::new(),
            base_url: DEFAULT_8X8_BASE_URL.to_string(),
        }
    }
}

// ============================================================================
// Redaction Configuration
// ============================================================================

/// Identity redaction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Hash the user msisdn before handing it to the AI platform
    pub hide_user_id: bool,
    /// Hash the channel id before handing it to the AI platform
    pub hide_session_id: bool,
    /// Digest name, e.g. "sha256"
    pub hash_algorithm: String,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            hide_user_id: true,
            hide_session_id: true,
            hash_algorithm: "sha256".to_string(),
        }
    }
}

// ============================================================================
// Session Configuration
// ============================================================================

/// Which session store implementation to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Process-local map; lost on restart.
    #[default]
    Memory,
    /// One JSON file per session under `session.path`.
    File,
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds of inactivity after which the session timestamp is refreshed (0 disables)
    pub timeout_secs: u64,
    /// Store implementation
    pub backend: SessionBackend,
    /// Directory for the file backend (defaults to ~/.chatapps-bridge/sessions)
    pub path: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 1800,
            backend: SessionBackend::Memory,
            path: None,
        }
    }
}

// ============================================================================
// Formatter Configuration
// ============================================================================

/// Outbound formatter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Reject rich directives that lack required fields instead of patching them
    pub strict: bool,
    /// Body text used for interactive messages without one
    pub default_prompt: String,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            strict: true,
            default_prompt: "Please choose an option".to_string(),
        }
    }
}

// ============================================================================
// AI Platform Configuration
// ============================================================================

/// Cognigy REST endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CognigyConfig {
    /// Full REST endpoint URL, e.g. `https://endpoint-trial.cognigy.ai/<token>`
    pub endpoint_url: String,
}

// ============================================================================
// Server Configuration
// ============================================================================

/// How AI outputs are delivered back to 8x8.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransformerMode {
    /// Collect all outputs of one execution and deliver them together.
    #[default]
    Rest,
    /// Deliver each output as soon as it is produced.
    Webhook,
}

/// Gateway HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to
    pub bind_address: String,
    /// Port to listen on
    pub port: u16,
    /// URL path 8x8 posts webhooks to
    pub path: String,
    /// Output delivery mode
    pub mode: TransformerMode,
    /// Optional Bearer token required on inbound requests
    pub auth_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            path: "/webhook/8x8".to_string(),
            mode: TransformerMode::Rest,
            auth_token: None,
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output
    Pretty,
    /// Compact single-line output with a `component` field
    #[default]
    Component,
    /// JSON lines for log aggregators
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Append logs to this file instead of stderr
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Component,
            level: "info".to_string(),
            file: None,
        }
    }
}
