//! Usage metrics: counting evaluations, registering the client and posting
//! buckets to the server.

mod bucket;
mod sender;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use switchyard_core::{CLIENT_SPEC_VERSION, SDK_NAME};
use tokio::task::JoinHandle;

pub use bucket::{MetricsBucket, ToggleCount};
pub use sender::{HttpMetricSender, MetricSender};

use crate::config::ClientConfig;
use crate::events::{Event, EventDispatcher};
use crate::throttle::{Throttler, LONGEST_BACKOFF_SECS};

pub const PLATFORM_NAME: &str = "rust";

/// Reported as `platformVersion`. The toolchain that built the binary is not
/// known at run time, so this is the minimum supported Rust version declared
/// in the crate manifest.
fn minimum_rust_version() -> String {
    option_env!("CARGO_PKG_RUST_VERSION")
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Body of `POST /client/register`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRegistration {
    pub app_name: String,
    pub instance_id: String,
    pub connection_id: String,
    pub sdk_version: String,
    pub strategies: Vec<String>,
    pub started: DateTime<Utc>,
    pub interval: u64,
    pub environment: String,
    pub platform_name: String,
    pub platform_version: String,
    pub spec_version: String,
}

impl ClientRegistration {
    pub fn new(config: &ClientConfig, started: DateTime<Utc>, strategies: Vec<String>) -> Self {
        Self {
            app_name: config.app_name.clone(),
            instance_id: config.instance_id.clone(),
            connection_id: config.connection_id.clone(),
            sdk_version: SDK_NAME.to_string(),
            strategies,
            started,
            interval: config.metrics_interval.as_secs(),
            environment: config.environment.clone(),
            platform_name: PLATFORM_NAME.to_string(),
            platform_version: minimum_rust_version(),
            spec_version: CLIENT_SPEC_VERSION.to_string(),
        }
    }
}

/// Body of `POST /client/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMetrics {
    pub app_name: String,
    pub instance_id: String,
    pub connection_id: String,
    pub environment: String,
    pub spec_version: String,
    pub platform_name: String,
    pub platform_version: String,
    pub bucket: MetricsBucket,
}

impl ClientMetrics {
    pub fn new(config: &ClientConfig, bucket: MetricsBucket) -> Self {
        Self {
            app_name: config.app_name.clone(),
            instance_id: config.instance_id.clone(),
            connection_id: config.connection_id.clone(),
            environment: config.environment.clone(),
            spec_version: CLIENT_SPEC_VERSION.to_string(),
            platform_name: PLATFORM_NAME.to_string(),
            platform_version: minimum_rust_version(),
            bucket,
        }
    }
}

/// Counts evaluations and ships them to the server on an interval.
pub struct MetricsService {
    config: Arc<ClientConfig>,
    sender: Arc<dyn MetricSender>,
    dispatcher: EventDispatcher,
    throttler: Throttler,
    bucket: Mutex<MetricsBucket>,
    started: DateTime<Utc>,
}

impl MetricsService {
    pub fn new(config: Arc<ClientConfig>, sender: Arc<dyn MetricSender>, dispatcher: EventDispatcher) -> Self {
        let throttler = Throttler::new(
            config.metrics_interval.as_secs(),
            LONGEST_BACKOFF_SECS,
            config.urls.metrics.as_str(),
        );
        Self {
            config,
            sender,
            dispatcher,
            throttler,
            bucket: Mutex::new(MetricsBucket::new()),
            started: Utc::now(),
        }
    }

    fn enabled(&self) -> bool {
        !self.config.disable_metrics
    }

    fn with_bucket<T>(&self, f: impl FnOnce(&mut MetricsBucket) -> T) -> T {
        let mut guard = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn count(&self, name: &str, enabled: bool) {
        if self.enabled() {
            self.with_bucket(|b| b.register_count(name, enabled));
        }
    }

    pub fn count_variant(&self, name: &str, variant: &str) {
        if self.enabled() {
            self.with_bucket(|b| b.register_variant(name, variant));
        }
    }

    pub fn throttler(&self) -> &Throttler {
        &self.throttler
    }

    /// Swap out the current bucket, closing it.
    pub fn take_bucket(&self) -> MetricsBucket {
        let mut bucket = self.with_bucket(|b| std::mem::take(b));
        bucket.end();
        bucket
    }

    /// Announce this client to the server.
    pub async fn register(&self, strategies: Vec<String>) {
        if !self.enabled() {
            return;
        }
        let registration = ClientRegistration::new(&self.config, self.started, strategies);
        match self.sender.register_client(&registration).await {
            Ok(status) if status < 400 => {
                self.dispatcher.dispatch(Event::ClientRegistered(registration));
            }
            Ok(status) => {
                self.dispatcher.dispatch(Event::error(format!(
                    "Client registration failed with HTTP {status}"
                )));
            }
            Err(e) => self.dispatcher.dispatch(Event::error(e.to_string())),
        }
    }

    /// One tick of the metrics loop.
    pub async fn send_metrics(&self) {
        if !self.enabled() {
            return;
        }
        if !self.throttler.perform_action() {
            self.throttler.skipped();
            return;
        }
        let bucket = self.take_bucket();
        if bucket.is_empty() {
            tracing::debug!("No evaluations since last send, skipping metrics");
            return;
        }
        let metrics = ClientMetrics::new(&self.config, bucket);
        match self.sender.send_metrics(&metrics).await {
            Ok(status) if status < 400 => {
                self.throttler.decrement_failure_count_and_reset_skips();
                self.dispatcher.dispatch(Event::ClientMetrics(metrics));
            }
            Ok(status) => self.throttler.handle_http_error_codes(status),
            Err(e) => self.dispatcher.dispatch(Event::error(e.to_string())),
        }
    }

    /// Register, then send on every interval. Returns `None` when metrics
    /// are disabled.
    pub fn start(self: &Arc<Self>, strategies: Vec<String>) -> Option<JoinHandle<()>> {
        if !self.enabled() {
            return None;
        }
        let service = Arc::clone(self);
        let period = self.config.metrics_interval.max(Duration::from_secs(1));
        Some(tokio::spawn(async move {
            service.register(strategies).await;
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; the first send waits one period.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                service.send_metrics().await;
            }
        }))
    }
}
