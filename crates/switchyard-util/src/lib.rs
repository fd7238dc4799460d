//! Shared utilities for the Switchyard feature-toggle client.
//!
//! This crate provides cross-cutting concerns used by all other Switchyard
//! crates: error types, filesystem helpers, hashing, and terminal status
//! output for the CLI.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod progress;
