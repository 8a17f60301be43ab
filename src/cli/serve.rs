//! Serve command handler (webhook gateway).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use chatapps_bridge::config::validate::{validate_semantics, DiagnosticLevel};
use chatapps_bridge::executor::CognigyEndpoint;
use chatapps_bridge::gateway::{self, GatewayState};
use chatapps_bridge::session::store_from_config;
use chatapps_bridge::transformer::Transformer;

use super::load_config;

pub(crate) async fn cmd_serve(config_path: Option<&PathBuf>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    for diag in validate_semantics(&config)
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Warn)
    {
        warn!("{}", diag);
    }
    config.check().context("Invalid configuration")?;

    let store = store_from_config(&config).context("Failed to open session store")?;
    let transformer =
        Transformer::new(&config, store).context("Failed to build transformer")?;
    let executor = CognigyEndpoint::new(&config.cognigy);
    let state = GatewayState::new(
        Arc::new(transformer),
        Arc::new(executor),
        config.server.auth_token.clone(),
    );

    let mut handle = gateway::start(&config.server, state)
        .await
        .context("Failed to start gateway")?;
    println!(
        "chatapps-bridge listening on {}:{}{}",
        config.server.bind_address, config.server.port, config.server.path
    );

    let abort = handle.abort_handle();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("shutdown requested");
            abort.abort();
        }
        result = &mut handle => {
            result.context("Gateway task failed")?;
        }
    }

    Ok(())
}
