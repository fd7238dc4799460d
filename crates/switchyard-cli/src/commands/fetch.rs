//! Handler for `switchyard fetch`.

use std::path::Path;

use miette::Result;
use switchyard_core::config::Settings;
use switchyard_util::fs::write_atomic;
use switchyard_util::progress;

pub async fn exec(settings: Settings, output: Option<&Path>, verbose: bool) -> Result<()> {
    let collection = super::fetch_remote(settings, verbose).await?;

    if collection.is_empty() {
        progress::status_warn("Empty", "the server returned no toggles");
    } else {
        progress::status(
            "Fetched",
            &format!(
                "{} toggles, {} segments",
                collection.features.len(),
                collection.segments.len()
            ),
        );
    }

    if let Some(path) = output {
        let json = collection.to_json()?;
        write_atomic(path, json.as_bytes()).map_err(switchyard_util::errors::SwitchyardError::Io)?;
        progress::status("Wrote", &path.display().to_string());
    } else {
        for name in collection.toggle_names() {
            println!("{name}");
        }
    }

    Ok(())
}
