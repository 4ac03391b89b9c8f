//! CLI command implementations for carport.
//!
//! Each submodule implements a specific command:
//!
//! - [`serve`] - Run the gateway in the foreground
//! - [`check`] - Validate and print the effective configuration

pub mod check;
pub mod serve;
