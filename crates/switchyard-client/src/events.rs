//! Client lifecycle events and the subscriber that receives them.

use std::sync::Arc;

use serde::Serialize;
use switchyard_core::context::Context;

use crate::fetcher::FetchStatus;
use crate::metrics::{ClientMetrics, ClientRegistration};

/// Kind of impression: a plain on/off check or a variant lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImpressionKind {
    IsEnabled,
    GetVariant,
}

/// Emitted for toggles that have impression data switched on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpressionEvent {
    pub event_id: String,
    pub event_type: ImpressionKind,
    pub feature_name: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub context: Context,
}

impl ImpressionEvent {
    pub fn new(kind: ImpressionKind, feature_name: &str, enabled: bool, variant: Option<String>, context: Context) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type: kind,
            feature_name: feature_name.to_string(),
            enabled,
            variant,
            context,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The first successful fetch completed.
    Ready,
    Error { message: String },
    ToggleEvaluated { name: String, enabled: bool },
    TogglesFetched { status: FetchStatus, http_status: u16, toggle_count: usize },
    ClientMetrics(ClientMetrics),
    ClientRegistered(ClientRegistration),
    FeaturesBackedUp { toggle_count: usize },
    FeaturesBackupRestored { toggle_count: usize },
    FeaturesBootstrapped { toggle_count: usize },
    Impression(ImpressionEvent),
}

impl Event {
    pub fn error(message: impl Into<String>) -> Self {
        Event::Error {
            message: message.into(),
        }
    }

    /// Route this event to the matching [`Subscriber`] method.
    pub fn publish_to(&self, subscriber: &dyn Subscriber) {
        match self {
            Event::Ready => subscriber.on_ready(),
            Event::Error { message } => subscriber.on_error(message),
            Event::ToggleEvaluated { name, enabled } => subscriber.toggle_evaluated(name, *enabled),
            Event::TogglesFetched {
                status,
                http_status,
                toggle_count,
            } => subscriber.toggles_fetched(*status, *http_status, *toggle_count),
            Event::ClientMetrics(metrics) => subscriber.client_metrics(metrics),
            Event::ClientRegistered(registration) => subscriber.client_registered(registration),
            Event::FeaturesBackedUp { toggle_count } => subscriber.toggles_backed_up(*toggle_count),
            Event::FeaturesBackupRestored { toggle_count } => {
                subscriber.toggle_backup_restored(*toggle_count)
            }
            Event::FeaturesBootstrapped { toggle_count } => {
                subscriber.toggles_bootstrapped(*toggle_count)
            }
            Event::Impression(impression) => subscriber.impression(impression),
        }
    }
}

/// Receives client events. Every method defaults to doing nothing, except
/// [`Subscriber::on_error`] which logs a warning.
pub trait Subscriber: Send + Sync {
    /// Called for every event before the specific method.
    fn on_event(&self, _event: &Event) {}

    fn on_ready(&self) {}

    fn on_error(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn toggle_evaluated(&self, _name: &str, _enabled: bool) {}

    fn toggles_fetched(&self, _status: FetchStatus, _http_status: u16, _toggle_count: usize) {}

    fn client_metrics(&self, _metrics: &ClientMetrics) {}

    fn client_registered(&self, _registration: &ClientRegistration) {}

    fn toggles_backed_up(&self, _toggle_count: usize) {}

    fn toggle_backup_restored(&self, _toggle_count: usize) {}

    fn toggles_bootstrapped(&self, _toggle_count: usize) {}

    fn impression(&self, _event: &ImpressionEvent) {}
}

/// Subscriber that only keeps the default warning on errors.
pub struct NoopSubscriber;

impl Subscriber for NoopSubscriber {}

/// Logs every event through `tracing`.
pub struct LogSubscriber;

impl Subscriber for LogSubscriber {
    fn on_ready(&self) {
        tracing::info!("Client is ready");
    }

    fn on_error(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn toggle_evaluated(&self, name: &str, enabled: bool) {
        tracing::debug!("{name}: {enabled}");
    }

    fn toggles_fetched(&self, status: FetchStatus, http_status: u16, toggle_count: usize) {
        tracing::info!("Fetch toggles with status {status:?} (HTTP {http_status}), {toggle_count} toggles");
    }

    fn client_metrics(&self, metrics: &ClientMetrics) {
        tracing::info!("Sent metrics for {} toggles", metrics.bucket.toggles.len());
    }

    fn client_registered(&self, registration: &ClientRegistration) {
        tracing::info!(
            "Client registered {} with instance id {}",
            registration.app_name,
            registration.instance_id
        );
    }

    fn toggles_backed_up(&self, toggle_count: usize) {
        tracing::debug!("Backup stored with {toggle_count} toggles");
    }

    fn toggle_backup_restored(&self, toggle_count: usize) {
        tracing::info!("Backup restored with {toggle_count} toggles");
    }

    fn toggles_bootstrapped(&self, toggle_count: usize) {
        tracing::info!("Bootstrapped {toggle_count} toggles");
    }

    fn impression(&self, event: &ImpressionEvent) {
        tracing::debug!(
            "Impression {:?} for {}: enabled={}",
            event.event_type,
            event.feature_name,
            event.enabled
        );
    }
}

/// Delivers events to the configured subscriber on the calling thread.
#[derive(Clone)]
pub struct EventDispatcher {
    subscriber: Arc<dyn Subscriber>,
}

impl EventDispatcher {
    pub fn new(subscriber: Arc<dyn Subscriber>) -> Self {
        Self { subscriber }
    }

    pub fn dispatch(&self, event: Event) {
        self.subscriber.on_event(&event);
        event.publish_to(self.subscriber.as_ref());
    }
}
