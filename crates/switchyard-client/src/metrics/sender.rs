use std::sync::Arc;

use reqwest::{Client, Url};
use serde::Serialize;
use switchyard_util::errors::SwitchyardError;

use super::{ClientMetrics, ClientRegistration};
use crate::config::ClientConfig;
use crate::http;

/// Delivers registrations and metrics to the server. Returns the HTTP status.
#[async_trait::async_trait]
pub trait MetricSender: Send + Sync {
    async fn register_client(&self, registration: &ClientRegistration) -> Result<u16, SwitchyardError>;
    async fn send_metrics(&self, metrics: &ClientMetrics) -> Result<u16, SwitchyardError>;
}

/// Posts JSON to `/client/register` and `/client/metrics`.
pub struct HttpMetricSender {
    config: Arc<ClientConfig>,
    client: Client,
}

impl HttpMetricSender {
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, SwitchyardError> {
        let client = http::build_client(&config)?;
        Ok(Self { config, client })
    }

    async fn post<T: Serialize + Sync>(&self, url: &Url, body: &T) -> Result<u16, SwitchyardError> {
        let response = http::with_headers(self.client.post(url.clone()), &self.config)
            .json(body)
            .send()
            .await
            .map_err(|e| SwitchyardError::network(format!("Could not post to {url}: {e}")))?;
        Ok(response.status().as_u16())
    }
}

#[async_trait::async_trait]
impl MetricSender for HttpMetricSender {
    async fn register_client(&self, registration: &ClientRegistration) -> Result<u16, SwitchyardError> {
        self.post(&self.config.urls.register, registration).await
    }

    async fn send_metrics(&self, metrics: &ClientMetrics) -> Result<u16, SwitchyardError> {
        self.post(&self.config.urls.metrics, metrics).await
    }
}
