//! Local evaluation of feature toggles.
//!
//! The [`Engine`] holds the current toggle state and answers `is_enabled` and
//! `get_variant` questions without touching the network.

pub mod constraint;
pub mod engine;
pub mod hash;
pub mod ip;
pub mod strategy;
pub mod variant;

pub use engine::{Engine, EngineState};
pub use strategy::Strategy;
