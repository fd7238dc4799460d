//! Core data types for the Switchyard feature-toggle client.
//!
//! This crate defines the shapes that travel between the toggle server and
//! the client: feature toggles, activation strategies, constraints,
//! segments, variant definitions, the evaluation context, and the settings
//! file that configures a client.
//!
//! This crate is intentionally free of async code and network I/O.

/// Version of the client specification this implementation follows.
pub const CLIENT_SPEC_VERSION: &str = "5.1.9";

/// SDK identifier reported to the server, `name:version`.
pub const SDK_NAME: &str = concat!("switchyard-rust:", env!("CARGO_PKG_VERSION"));

pub mod collection;
pub mod config;
pub mod context;
pub mod feature;
mod serde_util;
pub mod variant;
