use std::sync::{Arc, Mutex, PoisonError};

use reqwest::header::{ETAG, IF_NONE_MATCH, LOCATION};
use reqwest::{Client, StatusCode, Url};
use switchyard_core::collection::FeatureCollection;
use switchyard_util::errors::SwitchyardError;

use crate::config::ClientConfig;
use crate::http;

/// Coarse outcome of a fetch, as reported in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Changed,
    NotChanged,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchResponse {
    Changed(FeatureCollection),
    NotChanged,
    Unavailable { status: u16, location: Option<String> },
}

impl FetchResponse {
    pub fn status(&self) -> FetchStatus {
        match self {
            FetchResponse::Changed(_) => FetchStatus::Changed,
            FetchResponse::NotChanged => FetchStatus::NotChanged,
            FetchResponse::Unavailable { .. } => FetchStatus::Unavailable,
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            FetchResponse::Changed(_) => 200,
            FetchResponse::NotChanged => 304,
            FetchResponse::Unavailable { status, .. } => *status,
        }
    }

    pub fn toggle_count(&self) -> usize {
        match self {
            FetchResponse::Changed(collection) => collection.features.len(),
            _ => 0,
        }
    }
}

/// Source of toggle definitions.
#[async_trait::async_trait]
pub trait FeatureFetcher: Send + Sync {
    async fn fetch_features(&self) -> Result<FetchResponse, SwitchyardError>;
}

/// Fetches `/client/features` with conditional requests.
pub struct HttpFeatureFetcher {
    config: Arc<ClientConfig>,
    client: Client,
    etag: Mutex<Option<String>>,
}

impl HttpFeatureFetcher {
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, SwitchyardError> {
        let client = http::build_client(&config)?;
        Ok(Self {
            config,
            client,
            etag: Mutex::new(None),
        })
    }

    pub fn etag(&self) -> Option<String> {
        self.etag.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, SwitchyardError> {
        let mut request = http::with_headers(self.client.get(url.clone()), &self.config)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(etag) = self.etag() {
            request = request.header(IF_NONE_MATCH, etag);
        }
        request
            .send()
            .await
            .map_err(|e| SwitchyardError::network(format!("Request to {url} failed: {e}")))
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait::async_trait]
impl FeatureFetcher for HttpFeatureFetcher {
    async fn fetch_features(&self) -> Result<FetchResponse, SwitchyardError> {
        let url = self.config.urls.features.clone();
        let mut response = self.get(url.clone()).await?;

        if is_redirect(response.status()) {
            if let Some(target) = location(&response) {
                let next = url
                    .join(&target)
                    .map_err(|e| SwitchyardError::network(format!("Bad redirect to {target}: {e}")))?;
                tracing::info!("Redirecting from {url} to {next}. Please update your configuration");
                response = self.get(next).await?;
            }
        }

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchResponse::NotChanged);
        }
        if !status.is_success() {
            return Ok(FetchResponse::Unavailable {
                status: status.as_u16(),
                location: location(&response),
            });
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| SwitchyardError::network(format!("Failed to read response from {url}: {e}")))?;
        let collection = FeatureCollection::from_json(&body)?;
        *self.etag.lock().unwrap_or_else(PoisonError::into_inner) = etag;
        Ok(FetchResponse::Changed(collection))
    }
}
