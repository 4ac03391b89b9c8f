//! carport: an HTTP gateway for Filecoin chain snapshot archives.
//!
//! Snapshot files (`.car.zst`) live in object storage buckets, keyed by paths
//! that embed the chain epoch as a `height_<digits>` token. A validation
//! pipeline drops a `.sha256sum` sidecar next to each snapshot it has checked.
//! carport fronts those buckets with:
//!
//! - server-rendered listing pages with search and pagination
//! - a byte-range-capable download proxy under `/archive`
//! - "latest validated snapshot" endpoints under `/latest*`
//!
//! The crate is organized as:
//!
//! - [`store`] - the object storage abstraction and its backends
//! - [`listing`] - the enumerate/sort/select/paginate engine
//! - [`server`] - the axum HTTP surface
//! - [`config`] - TOML configuration
//! - [`commands`] - CLI command implementations

pub mod commands;
pub mod config;
pub mod listing;
pub mod security;
pub mod server;
pub mod store;
pub mod utils;
