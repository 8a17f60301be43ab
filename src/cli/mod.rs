//! CLI module: command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod config;
pub mod serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

use chatapps_bridge::config::Config;
use chatapps_bridge::redact::{HashAlgorithm, Redactor};

#[derive(Parser)]
#[command(name = "chatapps-bridge")]
#[command(version)]
#[command(about = "Bridge between an AI conversation platform and 8x8 WhatsApp", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.chatapps-bridge/config.json)
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook gateway
    Serve {
        /// Override server.port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the redacted form of an identifier
    Hash {
        /// Phone number or channel id
        value: String,
        /// Digest algorithm (defaults to redaction.hash_algorithm)
        #[arg(short, long)]
        algorithm: Option<String>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file
    Check,
    /// Print the effective configuration (secrets masked)
    Show,
}

/// Load config from `--config` or the default path.
pub(crate) fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let path = path.cloned().unwrap_or_else(Config::path);
    Config::load_from_path(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Respect logging settings from config; fall back to defaults if the
    // file is missing or unreadable.
    let logging_cfg = load_config(cli.config_path.as_ref())
        .map(|c| c.logging)
        .unwrap_or_default();
    if let Err(e) = chatapps_bridge::utils::logging::init_logging(&logging_cfg) {
        eprintln!("warning: {}", e);
    }

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Version) => cmd_version(),
        Some(Commands::Serve { port }) => {
            serve::cmd_serve(cli.config_path.as_ref(), port).await?;
        }
        Some(Commands::Hash { value, algorithm }) => {
            cmd_hash(cli.config_path.as_ref(), &value, algorithm.as_deref())?;
        }
        Some(Commands::Config { action }) => {
            config::cmd_config(cli.config_path.as_ref(), action).await?;
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("chatapps-bridge {}", chatapps_bridge::VERSION);
    println!();
    println!("Bridge between an AI conversation platform and 8x8 WhatsApp");
}

/// Print the digest the gateway would use for `value`.
fn cmd_hash(config_path: Option<&PathBuf>, value: &str, algorithm: Option<&str>) -> Result<()> {
    let name = match algorithm {
        Some(a) => a.to_string(),
        None => load_config(config_path)?.redaction.hash_algorithm,
    };
    let algorithm: HashAlgorithm = name.parse()?;
    let redactor = Redactor::new(algorithm, true, true);
    println!("{}", redactor.redact(value));
    Ok(())
}
