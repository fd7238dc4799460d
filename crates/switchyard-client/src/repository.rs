//! Keeps the engine's toggle state current.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use switchyard_core::collection::FeatureCollection;
use switchyard_engine::Engine;
use switchyard_util::errors::SwitchyardError;
use tokio::task::JoinHandle;

use crate::backup::BackupHandler;
use crate::config::ClientConfig;
use crate::events::{Event, EventDispatcher};
use crate::fetcher::{FeatureFetcher, FetchResponse};
use crate::throttle::{Throttler, LONGEST_BACKOFF_SECS};

pub struct Repository {
    config: Arc<ClientConfig>,
    engine: Arc<Engine>,
    fetcher: Arc<dyn FeatureFetcher>,
    backup: Arc<dyn BackupHandler>,
    dispatcher: EventDispatcher,
    throttler: Throttler,
    ready: AtomicBool,
}

impl Repository {
    pub fn new(
        config: Arc<ClientConfig>,
        engine: Arc<Engine>,
        fetcher: Arc<dyn FeatureFetcher>,
        backup: Arc<dyn BackupHandler>,
        dispatcher: EventDispatcher,
    ) -> Self {
        let throttler = Throttler::new(
            config.fetch_interval.as_secs(),
            LONGEST_BACKOFF_SECS,
            config.urls.features.as_str(),
        );
        Self {
            config,
            engine,
            fetcher,
            backup,
            dispatcher,
            throttler,
            ready: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn throttler(&self) -> &Throttler {
        &self.throttler
    }

    /// Load local state, optionally fetch once, then start polling.
    ///
    /// Fails only when a synchronous first fetch was requested and did not
    /// succeed.
    pub async fn start(self: &Arc<Self>) -> Result<Option<JoinHandle<()>>, SwitchyardError> {
        self.load_local_state();

        if self.config.synchronous_fetch {
            self.update_features().await?;
        }

        if self.config.disable_polling {
            return Ok(None);
        }

        let repo = Arc::clone(self);
        let interval = self.config.fetch_interval;
        let skip_first = self.config.synchronous_fetch;
        Ok(Some(tokio::spawn(async move {
            if interval.is_zero() {
                if !skip_first {
                    repo.poll_once().await;
                }
                return;
            }
            let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
            if skip_first {
                ticker.tick().await;
            }
            loop {
                ticker.tick().await;
                repo.poll_once().await;
            }
        })))
    }

    fn load_local_state(&self) {
        if let Some(collection) = self.backup.read() {
            self.engine.take_state(collection);
            return;
        }
        let Some(json) = self.config.bootstrap.as_ref().and_then(|b| b.read()) else {
            return;
        };
        match FeatureCollection::from_json(&json) {
            Ok(collection) => {
                let toggle_count = collection.features.len();
                self.engine.take_state(collection);
                self.dispatcher
                    .dispatch(Event::FeaturesBootstrapped { toggle_count });
            }
            Err(e) => self
                .dispatcher
                .dispatch(Event::error(format!("Failed to read bootstrap toggles: {e}"))),
        }
    }

    async fn poll_once(&self) {
        if let Err(e) = self.update_features().await {
            self.dispatcher.dispatch(Event::error(e.to_string()));
        }
    }

    /// One polling tick: fetch unless backing off, then apply the result.
    pub async fn update_features(&self) -> Result<(), SwitchyardError> {
        if !self.throttler.perform_action() {
            self.throttler.skipped();
            return Ok(());
        }

        let response = self.fetcher.fetch_features().await?;
        self.dispatcher.dispatch(Event::TogglesFetched {
            status: response.status(),
            http_status: response.http_status(),
            toggle_count: response.toggle_count(),
        });

        match response {
            FetchResponse::Changed(collection) => {
                self.backup.write(&collection);
                self.engine.take_state(collection);
            }
            FetchResponse::NotChanged => {}
            FetchResponse::Unavailable { status, .. } => {
                let ready = self.is_ready();
                if !ready && self.config.synchronous_fetch {
                    return Err(SwitchyardError::Initialization {
                        message: format!("got response code {status} from {}", self.config.urls.features),
                    });
                }
                if ready {
                    self.throttler.handle_http_error_codes(status);
                }
                return Ok(());
            }
        }

        self.throttler.decrement_failure_count_and_reset_skips();
        if !self.ready.swap(true, Ordering::AcqRel) {
            self.dispatcher.dispatch(Event::Ready);
        }
        Ok(())
    }
}
