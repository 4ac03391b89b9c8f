//! Run the gateway server in the foreground.

use anyhow::Result;
use std::path::Path;
use tracing::warn;

use crate::config::Config;
use crate::server;

/// Load configuration, apply CLI overrides and serve until interrupted.
///
/// # Errors
///
/// Returns an error when the configuration is invalid or the server fails
/// to start.
pub async fn execute(
    config_path: Option<&Path>,
    port: Option<u16>,
    bind: Option<String>,
) -> Result<()> {
    let mut config = Config::load(config_path)?;

    // CLI flags override the config file.
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let validation = config.validate()?;
    for warning in &validation.warnings {
        warn!("{warning}");
    }

    server::serve(&config).await
}
