use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use switchyard_core::context::Context;
use switchyard_core::feature::{EvaluatedToggle, FeatureDefinition};
use switchyard_core::variant::Variant;
use switchyard_engine::Engine;
use switchyard_util::errors::SwitchyardError;
use tokio::task::JoinHandle;

use crate::backup::{BackupHandler, FileBackupHandler};
use crate::config::ClientConfig;
use crate::events::{Event, EventDispatcher, ImpressionEvent, ImpressionKind};
use crate::fetcher::{FeatureFetcher, HttpFeatureFetcher};
use crate::metrics::{HttpMetricSender, MetricSender, MetricsService};
use crate::repository::Repository;
use crate::toggles::FeatureToggles;

/// Live clients per identifier, for duplicate detection.
static INSTANCES: LazyLock<Mutex<HashMap<String, usize>>> = LazyLock::new(|| Mutex::new(HashMap::new()));

fn register_instance(identifier: &str, fail: bool) -> Result<(), SwitchyardError> {
    let mut instances = INSTANCES.lock().unwrap_or_else(PoisonError::into_inner);
    let count = instances.entry(identifier.to_string()).or_insert(0);
    if *count > 0 {
        let message = format!(
            "You already have {count} client(s) running with the same app name, instance id and API key. \
             Share a single client instead of creating new ones"
        );
        if fail {
            return Err(SwitchyardError::Initialization { message });
        }
        tracing::error!("{message}");
    }
    *count += 1;
    Ok(())
}

fn release_instance(identifier: &str) {
    let mut instances = INSTANCES.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(count) = instances.get_mut(identifier) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            instances.remove(identifier);
        }
    }
}

/// A running feature-toggle client.
///
/// Created with [`Client::start`]; background polling and metrics stop on
/// [`FeatureToggles::shutdown`] or when the client is dropped.
pub struct Client {
    config: Arc<ClientConfig>,
    engine: Arc<Engine>,
    repository: Arc<Repository>,
    metrics: Arc<MetricsService>,
    dispatcher: EventDispatcher,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    identifier: String,
    stopped: AtomicBool,
}

impl Client {
    /// Load local state, start polling and metrics. Must run inside a tokio runtime.
    pub async fn start(config: ClientConfig) -> miette::Result<Self> {
        let config = Arc::new(config);
        let identifier = config.client_identifier();
        register_instance(&identifier, config.fail_on_multiple_instances)?;

        match Self::start_registered(config, identifier.clone()).await {
            Ok(client) => Ok(client),
            Err(e) => {
                release_instance(&identifier);
                Err(e.into())
            }
        }
    }

    async fn start_registered(config: Arc<ClientConfig>, identifier: String) -> Result<Self, SwitchyardError> {
        let dispatcher = EventDispatcher::new(Arc::clone(&config.subscriber));
        let engine = Arc::new(Engine::with_strategies(
            config.strategies.clone(),
            config.fallback_strategy.clone(),
        ));

        let fetcher: Arc<dyn FeatureFetcher> = match &config.fetcher {
            Some(fetcher) => Arc::clone(fetcher),
            None => Arc::new(HttpFeatureFetcher::new(Arc::clone(&config))?),
        };
        let sender: Arc<dyn MetricSender> = match &config.metric_sender {
            Some(sender) => Arc::clone(sender),
            None => Arc::new(HttpMetricSender::new(Arc::clone(&config))?),
        };
        let backup: Arc<dyn BackupHandler> = Arc::new(FileBackupHandler::new(
            config.backup_file.clone(),
            dispatcher.clone(),
        ));

        let repository = Arc::new(Repository::new(
            Arc::clone(&config),
            Arc::clone(&engine),
            fetcher,
            backup,
            dispatcher.clone(),
        ));
        let metrics = Arc::new(MetricsService::new(Arc::clone(&config), sender, dispatcher.clone()));

        let mut tasks = Vec::new();
        if let Some(task) = repository.start().await? {
            tasks.push(task);
        }
        if let Some(task) = metrics.start(engine.strategy_names()) {
            tasks.push(task);
        }
        tracing::debug!("Started client {} ({})", config.app_name, config.instance_id);

        Ok(Self {
            config,
            engine,
            repository,
            metrics,
            dispatcher,
            tasks: Mutex::new(tasks),
            identifier,
            stopped: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn metrics(&self) -> &MetricsService {
        &self.metrics
    }

    /// True once a fetch from the server has succeeded.
    pub fn is_ready(&self) -> bool {
        self.repository.is_ready()
    }

    /// The context from the configured [`crate::config::ContextProvider`].
    pub fn current_context(&self) -> Context {
        self.config.context_provider.context()
    }

    fn enrich(&self, context: &Context) -> Context {
        context.apply_static_fields(&self.config.app_name, &self.config.environment)
    }

    fn impression(&self, kind: ImpressionKind, name: &str, enabled: bool, variant: Option<String>, context: Context) {
        if self.engine.should_emit_impression(name) {
            self.dispatcher.dispatch(Event::Impression(ImpressionEvent::new(
                kind, name, enabled, variant, context,
            )));
        }
    }
}

impl FeatureToggles for Client {
    fn is_enabled_with(&self, name: &str, context: &Context, fallback: &dyn Fn(&str, &Context) -> bool) -> bool {
        let context = self.enrich(context);
        let enabled = self
            .engine
            .is_enabled(name, &context)
            .unwrap_or_else(|| fallback(name, &context));
        self.metrics.count(name, enabled);
        self.dispatcher.dispatch(Event::ToggleEvaluated {
            name: name.to_string(),
            enabled,
        });
        self.impression(ImpressionKind::IsEnabled, name, enabled, None, context);
        enabled
    }

    fn variant_or(&self, name: &str, context: &Context, default: Variant) -> Variant {
        let context = self.enrich(context);
        let resolved = self.engine.get_variant(name, &context);
        let enabled = resolved.as_ref().is_some_and(|v| v.feature_enabled);
        let variant = resolved.unwrap_or(default);
        self.metrics.count(name, enabled);
        self.metrics.count_variant(name, &variant.name);
        self.impression(
            ImpressionKind::GetVariant,
            name,
            enabled,
            Some(variant.name.clone()),
            context,
        );
        variant
    }

    fn toggle_names(&self) -> Vec<String> {
        self.engine.toggle_names()
    }

    fn definition(&self, name: &str) -> Option<FeatureDefinition> {
        self.engine.definition(name)
    }

    fn evaluate_all(&self, context: &Context) -> Vec<EvaluatedToggle> {
        self.engine.evaluate_all(&self.enrich(context))
    }

    fn count(&self, name: &str, enabled: bool) {
        self.metrics.count(name, enabled);
    }

    fn count_variant(&self, name: &str, variant: &str) {
        self.metrics.count_variant(name, variant);
    }

    fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            task.abort();
        }
        release_instance(&self.identifier);
        tracing::debug!("Client {} shut down", self.config.app_name);
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown();
    }
}
