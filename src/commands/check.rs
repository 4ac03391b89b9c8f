//! Validate and print the effective configuration.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;

/// Load the configuration, print the effective values and run validation.
///
/// # Errors
///
/// Returns an error when the file cannot be loaded or validation finds
/// errors, so `carport check` exits nonzero on a broken config.
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("Effective configuration:");
    println!("  server.bind                  = {}", config.server.bind);
    println!("  server.port                  = {}", config.server.port);
    println!(
        "  server.static_dir            = {}",
        config.server.static_dir.display()
    );
    println!(
        "  server.request_timeout_secs  = {}",
        config.server.request_timeout_secs
    );
    println!(
        "  buckets.forest               = {}",
        config.buckets.forest.display()
    );
    println!(
        "  buckets.snapshot             = {}",
        config.buckets.snapshot.display()
    );
    println!(
        "  buckets.snapshot-v2          = {}",
        config.buckets.snapshot_v2.display()
    );
    println!();

    let validation = config.validate()?;
    if validation.has_warnings() {
        println!("Warnings:");
        for warning in &validation.warnings {
            println!("  - {warning}");
        }
    } else {
        println!("Configuration is valid.");
    }

    Ok(())
}
