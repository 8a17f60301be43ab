//! Configuration management for chatapps-bridge
//!
//! Configuration is loaded from `~/.chatapps-bridge/config.json` (or an explicit
//! path) and then overridden by environment variables.

mod types;
pub mod validate;

pub use types::*;

use crate::error::{BridgeError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "CHATAPPS_BRIDGE";

impl Config {
    /// Returns the bridge configuration directory path (~/.chatapps-bridge)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chatapps-bridge")
    }

    /// Returns the path to the config file (~/.chatapps-bridge/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from `path` with environment overrides.
    ///
    /// If the file doesn't exist, returns the default configuration.
    /// Environment variables override values using the pattern
    /// `CHATAPPS_BRIDGE_<SECTION>_<KEY>`.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        // 8x8
        if let Some(val) = env_var("EIGHTBYEIGHT_API_KEY") {
            self.eightbyeight.api_key = val;
        }
        if let Some(val) = env_var("EIGHTBYEIGHT_SUB_ACCOUNT_ID") {
            self.eightbyeight.sub_account_id = val;
        }
        if let Some(val) = env_var("EIGHTBYEIGHT_BASE_URL") {
            self.eightbyeight.base_url = val;
        }

        // Redaction
        if let Some(v) = env_parse("REDACTION_HIDE_USER_ID") {
            self.redaction.hide_user_id = v;
        }
        if let Some(v) = env_parse("REDACTION_HIDE_SESSION_ID") {
            self.redaction.hide_session_id = v;
        }
        if let Some(val) = env_var("REDACTION_HASH_ALGORITHM") {
            self.redaction.hash_algorithm = val;
        }

        // Session
        if let Some(v) = env_parse("SESSION_TIMEOUT_SECS") {
            self.session.timeout_secs = v;
        }
        if let Some(v) = env_enum("SESSION_BACKEND") {
            self.session.backend = v;
        }
        if let Some(val) = env_var("SESSION_PATH") {
            self.session.path = Some(val);
        }

        // Formatter
        if let Some(v) = env_parse("FORMATTER_STRICT") {
            self.formatter.strict = v;
        }
        if let Some(val) = env_var("FORMATTER_DEFAULT_PROMPT") {
            self.formatter.default_prompt = val;
        }

        // Cognigy
        if let Some(val) = env_var("COGNIGY_ENDPOINT_URL") {
            self.cognigy.endpoint_url = val;
        }

        // Server
        if let Some(val) = env_var("SERVER_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(v) = env_parse("SERVER_PORT") {
            self.server.port = v;
        }
        if let Some(val) = env_var("SERVER_PATH") {
            self.server.path = val;
        }
        if let Some(v) = env_enum("SERVER_MODE") {
            self.server.mode = v;
        }
        if let Some(val) = env_var("SERVER_AUTH_TOKEN") {
            self.server.auth_token = Some(val);
        }

        // Logging
        if let Some(val) = env_var("LOGGING_LEVEL") {
            self.logging.level = val;
        }
        if let Some(v) = env_enum("LOGGING_FORMAT") {
            self.logging.format = v;
        }
        if let Some(val) = env_var("LOGGING_FILE") {
            self.logging.file = Some(val);
        }
    }

    /// Fail with the first semantic error, if any.
    pub fn check(&self) -> Result<()> {
        let errors: Vec<String> = validate::validate_semantics(self)
            .into_iter()
            .filter(|d| d.level == validate::DiagnosticLevel::Error)
            .map(|d| d.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(BridgeError::Config(errors.join("; ")))
        }
    }

    /// Resolved directory for the file session backend.
    pub fn session_path(&self) -> PathBuf {
        match &self.session.path {
            Some(p) => expand_home(p),
            None => Self::dir().join("sessions"),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(format!("{}_{}", ENV_PREFIX, key)).ok()
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| v.parse().ok())
}

/// Enum values use their lowercase serde names, e.g. `webhook` or `file`.
fn env_enum<T: DeserializeOwned>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| serde_json::from_value(Value::String(v.trim().to_lowercase())).ok())
}

/// Expand ~ to home directory in a path string
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
