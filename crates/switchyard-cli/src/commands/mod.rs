//! Command dispatch and the plumbing shared by handlers.

mod eval;
mod fetch;
mod list;

use std::path::Path;
use std::sync::Arc;

use miette::Result;
use switchyard_client::fetcher::{FeatureFetcher, FetchResponse, HttpFeatureFetcher};
use switchyard_client::ClientConfigBuilder;
use switchyard_core::collection::FeatureCollection;
use switchyard_core::config::{Settings, AUTHORIZATION_HEADER};
use switchyard_util::errors::SwitchyardError;
use switchyard_util::progress;

use crate::cli::{Cli, Command};

const DEFAULT_APP_NAME: &str = "switchyard-cli";

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let settings = settings(&cli)?;
    match cli.command {
        Command::Fetch { output } => fetch::exec(settings, output.as_deref(), cli.verbose).await,
        Command::List { file } => list::exec(settings, file.as_deref(), cli.verbose).await,
        Command::Eval {
            toggle,
            file,
            user_id,
            session_id,
            remote_address,
            environment,
            properties,
            json,
        } => {
            let args = eval::EvalArgs {
                toggle,
                user_id,
                session_id,
                remote_address,
                environment,
                properties,
                json,
            };
            eval::exec(settings, file.as_deref(), args, cli.verbose).await
        }
    }
}

/// Settings file, then `UNLEASH_*` variables, then command-line flags.
fn settings(cli: &Cli) -> Result<Settings> {
    let base = match &cli.config {
        Some(path) => {
            if !path.is_file() {
                return Err(SwitchyardError::config(format!(
                    "Settings file not found: {}",
                    path.display()
                ))
                .into());
            }
            Settings::load_from(path)?
        }
        None => Settings::load()?,
    };
    let mut settings = base.with_env();
    if let Some(url) = &cli.url {
        settings.api_url = Some(url.clone());
    }
    if let Some(token) = &cli.token {
        settings
            .headers
            .insert(AUTHORIZATION_HEADER.to_string(), token.clone());
    }
    if let Some(app) = &cli.app_name {
        settings.app_name = Some(app.clone());
    }
    if settings.app_name.is_none() {
        settings.app_name = Some(DEFAULT_APP_NAME.to_string());
    }
    Ok(settings)
}

/// Toggles from `file` when given, otherwise from the server.
async fn load_collection(settings: Settings, file: Option<&Path>, verbose: bool) -> Result<FeatureCollection> {
    match file {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                SwitchyardError::config(format!("Failed to read {}: {e}", path.display()))
            })?;
            let collection = FeatureCollection::from_json(&content)?;
            if verbose {
                progress::status_info(
                    "Loaded",
                    &format!("{} toggles from {}", collection.features.len(), path.display()),
                );
            }
            Ok(collection)
        }
        None => fetch_remote(settings, verbose).await,
    }
}

/// One unconditional fetch from the configured server.
async fn fetch_remote(settings: Settings, verbose: bool) -> Result<FeatureCollection> {
    if settings.api_url.is_none() {
        return Err(SwitchyardError::config(
            "No server configured. Pass --url, set UNLEASH_API_URL or add api-url to the settings file",
        )
        .into());
    }
    let config = ClientConfigBuilder::from_settings(settings)
        .disable_polling()
        .disable_metrics()
        .build()?;
    let url = config.urls.features.to_string();
    let fetcher = HttpFeatureFetcher::new(Arc::new(config))?;

    let spinner = progress::spinner(&format!("Fetching toggles from {url}"));
    let response = fetcher.fetch_features().await;
    spinner.finish_and_clear();

    match response? {
        FetchResponse::Changed(collection) => {
            if verbose {
                progress::status("Fetched", &format!("{} toggles from {url}", collection.features.len()));
            }
            Ok(collection)
        }
        FetchResponse::NotChanged => Err(SwitchyardError::Http { status: 304, url }.into()),
        FetchResponse::Unavailable { status, .. } => Err(SwitchyardError::Http { status, url }.into()),
    }
}
