//! Shared HTTP plumbing for fetching toggles and posting metrics.

use reqwest::{redirect, Client, RequestBuilder};
use switchyard_util::errors::SwitchyardError;

use crate::config::ClientConfig;

/// Build a reqwest client honouring the configured timeouts and proxy.
/// Proxy environment variables are ignored; only the configured proxy is used.
///
/// Redirects are not followed automatically; the fetcher follows one
/// redirect itself so it can log it.
pub fn build_client(config: &ClientConfig) -> Result<Client, SwitchyardError> {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.connect_timeout + config.read_timeout)
        .redirect(redirect::Policy::none());
    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| SwitchyardError::config(format!("invalid proxy {proxy}: {e}")))?;
        builder = builder.proxy(proxy);
    } else {
        builder = builder.no_proxy();
    }
    builder
        .build()
        .map_err(|e| SwitchyardError::network(format!("Failed to create HTTP client: {e}")))
}

/// Attach identity, custom and provider headers.
pub fn with_headers(mut request: RequestBuilder, config: &ClientConfig) -> RequestBuilder {
    for (name, value) in config.request_headers() {
        request = request.header(name, value);
    }
    request
}
