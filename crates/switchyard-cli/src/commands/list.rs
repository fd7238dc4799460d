//! Handler for `switchyard list`.

use std::path::Path;

use console::Style;
use miette::Result;
use switchyard_core::collection::FeatureCollection;
use switchyard_core::config::Settings;

pub async fn exec(settings: Settings, file: Option<&Path>, verbose: bool) -> Result<()> {
    let collection = super::load_collection(settings, file, verbose).await?;

    if collection.is_empty() {
        println!("No toggles.");
        return Ok(());
    }

    for line in render(&collection) {
        println!("{line}");
    }
    Ok(())
}

fn render(collection: &FeatureCollection) -> Vec<String> {
    let width = collection
        .features
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(0);
    let on = Style::new().green();
    let off = Style::new().red();

    collection
        .features
        .iter()
        .map(|toggle| {
            let state = if toggle.enabled {
                on.apply_to("enabled ")
            } else {
                off.apply_to("disabled")
            };
            let strategies = match toggle.strategies.len() {
                1 => "1 strategy".to_string(),
                n => format!("{n} strategies"),
            };
            format!(
                "{:<width$}  {state}  {:<12}  {strategies}",
                toggle.name,
                toggle.project.as_deref().unwrap_or("-"),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::feature::{ActivationStrategy, FeatureToggle};

    #[test]
    fn rows_are_aligned() {
        let collection = FeatureCollection::new(
            vec![
                FeatureToggle::new("a", true).with_strategy(ActivationStrategy::new("default")),
                FeatureToggle::new("longer-name", false),
            ],
            vec![],
        );
        console::set_colors_enabled(false);
        let rows = render(&collection);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("a            enabled "));
        assert!(rows[0].ends_with("1 strategy"));
        assert!(rows[1].contains("disabled"));
        assert!(rows[1].ends_with("0 strategies"));
    }
}
