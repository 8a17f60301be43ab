//! Config check/show command handler.

use std::path::PathBuf;

use anyhow::{Context, Result};

use chatapps_bridge::config::validate::{validate_config, validate_semantics, DiagnosticLevel};
use chatapps_bridge::config::Config;

use super::{load_config, ConfigAction};

/// Replace a secret with a short recognisable prefix.
fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{}****", prefix)
}

pub(crate) async fn cmd_config(config_path: Option<&PathBuf>, action: ConfigAction) -> Result<()> {
    let path = config_path.cloned().unwrap_or_else(Config::path);
    match action {
        ConfigAction::Check => {
            println!("Config file: {}", path.display());

            let mut diagnostics = Vec::new();
            if path.exists() {
                let content =
                    std::fs::read_to_string(&path).context("Failed to read config file")?;
                let raw: serde_json::Value = match serde_json::from_str(&content) {
                    Ok(v) => v,
                    Err(e) => {
                        println!("[ERROR] Invalid JSON: {}", e);
                        return Ok(());
                    }
                };
                diagnostics.extend(validate_config(&raw));
            } else {
                println!("[OK] No config file found (using defaults and environment)");
            }

            let config = load_config(config_path)?;
            diagnostics.extend(validate_semantics(&config));

            for diag in &diagnostics {
                println!("{}", diag);
            }

            let errors = diagnostics
                .iter()
                .filter(|d| d.level == DiagnosticLevel::Error)
                .count();
            let warnings = diagnostics
                .iter()
                .filter(|d| d.level == DiagnosticLevel::Warn)
                .count();

            if errors == 0 && warnings == 0 {
                println!("\nConfiguration looks good!");
            } else {
                println!("\nFound {} error(s), {} warning(s)", errors, warnings);
            }
        }
        ConfigAction::Show => {
            let mut config = load_config(config_path)?;
            config.eightbyeight.api_key = mask(&config.eightbyeight.api_key);
            if let Some(token) = config.server.auth_token.as_mut() {
                *token = mask(token);
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
