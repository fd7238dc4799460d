//! Runtime configuration for a [`crate::Client`].

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::Url;
use switchyard_core::config::{Settings, AUTHORIZATION_HEADER};
use switchyard_core::context::Context;
use switchyard_core::{CLIENT_SPEC_VERSION, SDK_NAME};
use switchyard_engine::strategy::hostname::local_hostname;
use switchyard_engine::Strategy;
use switchyard_util::errors::SwitchyardError;
use switchyard_util::hash::sha256_parts;

use crate::bootstrap::{BootstrapProvider, FileBootstrapProvider};
use crate::events::{NoopSubscriber, Subscriber};
use crate::fetcher::FeatureFetcher;
use crate::metrics::MetricSender;

pub const HEADER_APP_NAME: &str = "UNLEASH-APPNAME";
pub const HEADER_INSTANCE_ID: &str = "UNLEASH-INSTANCEID";
pub const HEADER_CONNECTION_ID: &str = "unleash-connection-id";
pub const HEADER_SDK: &str = "unleash-sdk";
pub const HEADER_CLIENT_SPEC: &str = "Unleash-Client-Spec";

/// Supplies the context used when the caller does not pass one.
pub trait ContextProvider: Send + Sync {
    fn context(&self) -> Context;
}

/// Always returns an empty context.
pub struct DefaultContextProvider;

impl ContextProvider for DefaultContextProvider {
    fn context(&self) -> Context {
        Context::default()
    }
}

/// Supplies extra request headers, evaluated on every request.
pub trait CustomHeadersProvider: Send + Sync {
    fn headers(&self) -> HashMap<String, String>;
}

pub struct NoCustomHeaders;

impl CustomHeadersProvider for NoCustomHeaders {
    fn headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// The endpoints a client talks to, derived from the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrls {
    pub features: Url,
    pub metrics: Url,
    pub register: Url,
}

impl ServerUrls {
    pub fn new(api: &Url, project: Option<&str>, name_prefix: Option<&str>) -> Result<Self, SwitchyardError> {
        let join = |path: &str| {
            api.join(path)
                .map_err(|e| SwitchyardError::config(format!("invalid API url {api}: {e}")))
        };
        let mut features = join("client/features")?;
        if project.is_some() || name_prefix.is_some() {
            let mut query = features.query_pairs_mut();
            if let Some(project) = project {
                query.append_pair("project", project);
            }
            if let Some(prefix) = name_prefix {
                query.append_pair("namePrefix", prefix);
            }
        }
        Ok(Self {
            features,
            metrics: join("client/metrics")?,
            register: join("client/register")?,
        })
    }
}

/// Fully resolved client configuration. Build one with [`ClientConfig::builder`].
#[derive(Clone)]
pub struct ClientConfig {
    pub app_name: String,
    pub instance_id: String,
    pub connection_id: String,
    pub environment: String,
    pub api_url: Url,
    pub urls: ServerUrls,
    pub project: Option<String>,
    pub name_prefix: Option<String>,
    pub backup_file: PathBuf,
    pub fetch_interval: Duration,
    pub metrics_interval: Duration,
    pub disable_polling: bool,
    pub disable_metrics: bool,
    pub synchronous_fetch: bool,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub proxy: Option<String>,
    pub custom_headers: BTreeMap<String, String>,
    pub fail_on_multiple_instances: bool,
    pub context_provider: Arc<dyn ContextProvider>,
    pub subscriber: Arc<dyn Subscriber>,
    pub headers_provider: Arc<dyn CustomHeadersProvider>,
    pub strategies: Vec<Arc<dyn Strategy>>,
    pub fallback_strategy: Option<Arc<dyn Strategy>>,
    pub bootstrap: Option<Arc<dyn BootstrapProvider>>,
    pub fetcher: Option<Arc<dyn FeatureFetcher>>,
    pub metric_sender: Option<Arc<dyn MetricSender>>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.custom_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(AUTHORIZATION_HEADER))
            .map(|(_, v)| v.as_str())
    }

    /// Identifies this client for duplicate-instance detection.
    pub fn client_identifier(&self) -> String {
        sha256_parts([
            self.api_key().unwrap_or(""),
            self.app_name.as_str(),
            self.instance_id.as_str(),
        ])
    }

    /// Every header sent with requests to the server, in order: identity
    /// headers, static custom headers, then provider headers.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("User-Agent".to_string(), self.app_name.clone()),
            (HEADER_APP_NAME.to_string(), self.app_name.clone()),
            (HEADER_INSTANCE_ID.to_string(), self.instance_id.clone()),
            (HEADER_CONNECTION_ID.to_string(), self.connection_id.clone()),
            (HEADER_SDK.to_string(), SDK_NAME.to_string()),
            (HEADER_CLIENT_SPEC.to_string(), CLIENT_SPEC_VERSION.to_string()),
        ];
        headers.extend(self.custom_headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        headers.extend(self.headers_provider.headers());
        headers
    }
}

/// `{hostname}generated-{n}` with a random `n` below one million.
pub fn default_instance_id() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{}generated-{n}", local_hostname())
}

/// Backup file in the temp directory, named after the app.
pub fn default_backup_file(app_name: &str) -> PathBuf {
    let sanitized = app_name.replace(['/', '\\'], "-");
    std::env::temp_dir().join(format!("unleash-{sanitized}-repo.json"))
}

#[derive(Default)]
pub struct ClientConfigBuilder {
    settings: Settings,
    fail_on_multiple_instances: bool,
    context_provider: Option<Arc<dyn ContextProvider>>,
    subscriber: Option<Arc<dyn Subscriber>>,
    headers_provider: Option<Arc<dyn CustomHeadersProvider>>,
    strategies: Vec<Arc<dyn Strategy>>,
    fallback_strategy: Option<Arc<dyn Strategy>>,
    bootstrap: Option<Arc<dyn BootstrapProvider>>,
    fetcher: Option<Arc<dyn FeatureFetcher>>,
    metric_sender: Option<Arc<dyn MetricSender>>,
}

impl ClientConfigBuilder {
    /// Start from file/env settings.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.settings.app_name = Some(name.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.settings.api_url = Some(url.into());
        self
    }

    /// Sent as the `Authorization` header.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.settings
            .headers
            .insert(AUTHORIZATION_HEADER.to_string(), key.into());
        self
    }

    pub fn instance_id(mut self, id: impl Into<String>) -> Self {
        self.settings.instance_id = Some(id.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.settings.environment = environment.into();
        self
    }

    pub fn project_name(mut self, project: impl Into<String>) -> Self {
        self.settings.project = Some(project.into());
        self
    }

    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.name_prefix = Some(prefix.into());
        self
    }

    pub fn backup_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.backup_file = Some(path.into().to_string_lossy().into_owned());
        self
    }

    pub fn fetch_interval(mut self, interval: Duration) -> Self {
        self.settings.fetch_interval = interval.as_secs();
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.settings.metrics_interval = interval.as_secs();
        self
    }

    pub fn disable_polling(mut self) -> Self {
        self.settings.disable_polling = true;
        self
    }

    pub fn disable_metrics(mut self) -> Self {
        self.settings.disable_metrics = true;
        self
    }

    pub fn synchronous_fetch(mut self, enabled: bool) -> Self {
        self.settings.synchronous_fetch = enabled;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.settings.connect_timeout = timeout.as_secs();
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.settings.read_timeout = timeout.as_secs();
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.settings.proxy = Some(proxy.into());
        self
    }

    pub fn custom_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.headers.insert(name.into(), value.into());
        self
    }

    pub fn fail_on_multiple_instances(mut self, fail: bool) -> Self {
        self.fail_on_multiple_instances = fail;
        self
    }

    pub fn context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.context_provider = Some(provider);
        self
    }

    pub fn subscriber(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    pub fn custom_headers_provider(mut self, provider: Arc<dyn CustomHeadersProvider>) -> Self {
        self.headers_provider = Some(provider);
        self
    }

    pub fn strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn fallback_strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.fallback_strategy = Some(strategy);
        self
    }

    pub fn bootstrap(mut self, provider: Arc<dyn BootstrapProvider>) -> Self {
        self.bootstrap = Some(provider);
        self
    }

    /// Replace the HTTP fetcher, e.g. with an in-memory one in tests.
    pub fn fetcher(mut self, fetcher: Arc<dyn FeatureFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn metric_sender(mut self, sender: Arc<dyn MetricSender>) -> Self {
        self.metric_sender = Some(sender);
        self
    }

    pub fn build(self) -> Result<ClientConfig, SwitchyardError> {
        let settings = self.settings;
        let app_name = settings
            .app_name
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| SwitchyardError::config("app name is required"))?;
        let raw_url = settings
            .api_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| SwitchyardError::config("api url is required"))?;

        // Url::join treats the last segment as a file unless the path ends with '/'.
        let normalized = if raw_url.ends_with('/') {
            raw_url.clone()
        } else {
            format!("{raw_url}/")
        };
        let api_url = Url::parse(&normalized)
            .map_err(|e| SwitchyardError::config(format!("invalid api url {raw_url}: {e}")))?;
        let urls = ServerUrls::new(&api_url, settings.project.as_deref(), settings.name_prefix.as_deref())?;

        let backup_file = settings
            .backup_file
            .map(PathBuf::from)
            .unwrap_or_else(|| default_backup_file(&app_name));
        let bootstrap = self.bootstrap.or_else(|| {
            settings
                .bootstrap_file
                .map(FileBootstrapProvider::new)
                .or_else(FileBootstrapProvider::from_env)
                .map(|provider| Arc::new(provider) as Arc<dyn BootstrapProvider>)
        });

        Ok(ClientConfig {
            instance_id: settings.instance_id.unwrap_or_else(default_instance_id),
            connection_id: uuid::Uuid::new_v4().to_string(),
            app_name,
            environment: settings.environment,
            api_url,
            urls,
            project: settings.project,
            name_prefix: settings.name_prefix,
            backup_file,
            fetch_interval: Duration::from_secs(settings.fetch_interval),
            metrics_interval: Duration::from_secs(settings.metrics_interval),
            disable_polling: settings.disable_polling,
            disable_metrics: settings.disable_metrics,
            synchronous_fetch: settings.synchronous_fetch,
            connect_timeout: Duration::from_secs(settings.connect_timeout),
            read_timeout: Duration::from_secs(settings.read_timeout),
            proxy: settings.proxy,
            custom_headers: settings.headers,
            fail_on_multiple_instances: self.fail_on_multiple_instances,
            context_provider: self
                .context_provider
                .unwrap_or_else(|| Arc::new(DefaultContextProvider)),
            subscriber: self.subscriber.unwrap_or_else(|| Arc::new(NoopSubscriber)),
            headers_provider: self
                .headers_provider
                .unwrap_or_else(|| Arc::new(NoCustomHeaders)),
            strategies: self.strategies,
            fallback_strategy: self.fallback_strategy,
            bootstrap,
            fetcher: self.fetcher,
            metric_sender: self.metric_sender,
        })
    }
}
