//! Switchyard client runtime.
//!
//! Build a [`ClientConfig`], [`Client::start`] it inside a tokio runtime and
//! query toggles through the [`FeatureToggles`] trait. Toggle state is
//! fetched in the background, backed up to disk and evaluated locally.
//! [`FakeClient`] offers the same trait for tests.

pub mod backup;
pub mod bootstrap;
mod client;
pub mod config;
pub mod events;
mod fake;
pub mod fetcher;
pub mod http;
pub mod metrics;
pub mod repository;
pub mod throttle;
mod toggles;

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use fake::FakeClient;
pub use toggles::FeatureToggles;

pub use switchyard_core::context::Context;
pub use switchyard_core::variant::{Payload, Variant};
