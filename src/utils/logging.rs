//! Logging initialization for chatapps-bridge.
//!
//! Supports three formats:
//! - `pretty`: multi-line human-readable output
//! - `component`: compact single-line output, grep-friendly; use the
//!   [`log_component!`] macro to add a `component` field per subsystem
//! - `json`: structured JSON lines for log aggregators

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{BridgeError, Result};

/// Build the filter: `RUST_LOG` wins, then `cfg.level`.
pub fn env_filter(cfg: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level))
}

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted. Fails if
/// the log file can't be opened or a subscriber is already installed.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    let filter = env_filter(cfg);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match (&cfg.file, cfg.format) {
        (Some(path), format) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| BridgeError::Config(format!("failed to open log file {}: {}", path, e)))?;
            let writer = Arc::new(file);
            let builder = builder.with_ansi(false).with_writer(writer);
            match format {
                LogFormat::Json => builder.json().try_init(),
                LogFormat::Pretty => builder.pretty().try_init(),
                LogFormat::Component => builder.compact().try_init(),
            }
        }
        (None, LogFormat::Json) => builder.json().try_init(),
        (None, LogFormat::Pretty) => builder.pretty().try_init(),
        (None, LogFormat::Component) => builder.compact().try_init(),
    };

    result.map_err(|e| BridgeError::Config(format!("failed to install logger: {}", e)))
}

/// Emit a component-tagged tracing event.
///
/// ```
/// # use chatapps_bridge::log_component;
/// log_component!(info, "gateway", "listening");
/// log_component!(warn, "outbound", "provider slow", status = 503u16);
/// ```
#[macro_export]
macro_rules! log_component {
    ($level:ident, $component:expr, $msg:expr) => {
        tracing::$level!(component = $component, $msg)
    };
    ($level:ident, $component:expr, $msg:expr, $($key:ident = $val:expr),+ $(,)?) => {
        tracing::$level!(component = $component, $($key = $val,)+ $msg)
    };
}
