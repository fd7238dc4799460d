//! Handler for `switchyard eval`.

use std::path::Path;

use miette::Result;
use switchyard_core::config::Settings;
use switchyard_core::context::Context;
use switchyard_core::feature::EvaluatedToggle;
use switchyard_engine::Engine;
use switchyard_util::errors::SwitchyardError;

pub struct EvalArgs {
    pub toggle: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub remote_address: Option<String>,
    pub environment: Option<String>,
    pub properties: Vec<(String, String)>,
    pub json: bool,
}

impl EvalArgs {
    fn context(&self, app_name: &str, default_environment: &str) -> Context {
        let mut builder = Context::builder().now();
        if let Some(id) = &self.user_id {
            builder = builder.user_id(id);
        }
        if let Some(id) = &self.session_id {
            builder = builder.session_id(id);
        }
        if let Some(addr) = &self.remote_address {
            builder = builder.remote_address(addr);
        }
        if let Some(env) = &self.environment {
            builder = builder.environment(env);
        }
        for (key, value) in &self.properties {
            builder = builder.property(key, value);
        }
        builder
            .build()
            .apply_static_fields(app_name, default_environment)
    }
}

pub async fn exec(settings: Settings, file: Option<&Path>, args: EvalArgs, verbose: bool) -> Result<()> {
    let app_name = settings.app_name.clone().unwrap_or_default();
    let environment = settings.environment.clone();
    let collection = super::load_collection(settings, file, verbose).await?;

    let engine = Engine::new();
    engine.take_state(collection);
    let context = args.context(&app_name, &environment);

    let Some(enabled) = engine.is_enabled(&args.toggle, &context) else {
        return Err(SwitchyardError::Generic {
            message: format!("Unknown toggle '{}'", args.toggle),
        }
        .into());
    };
    let variant = engine
        .get_variant(&args.toggle, &context)
        .unwrap_or_default();
    tracing::debug!("Evaluated {} with {context:?}", args.toggle);

    let result = EvaluatedToggle {
        name: args.toggle,
        enabled,
        variant,
    };
    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| SwitchyardError::parse(format!("Failed to render result: {e}")))?;
        println!("{json}");
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &EvaluatedToggle) {
    println!(
        "{}: {}",
        result.name,
        if result.enabled { "enabled" } else { "disabled" }
    );
    let variant = &result.variant;
    match &variant.payload {
        Some(payload) => println!(
            "variant: {} ({} payload: {})",
            variant.name, payload.payload_type, payload.value
        ),
        None => println!("variant: {}", variant.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> EvalArgs {
        EvalArgs {
            toggle: "t".to_string(),
            user_id: Some("42".to_string()),
            session_id: None,
            remote_address: None,
            environment: None,
            properties: vec![("plan".to_string(), "pro".to_string())],
            json: false,
        }
    }

    #[test]
    fn context_fills_static_fields() {
        let ctx = args().context("cli", "default");
        assert_eq!(ctx.user_id.as_deref(), Some("42"));
        assert_eq!(ctx.app_name.as_deref(), Some("cli"));
        assert_eq!(ctx.environment.as_deref(), Some("default"));
        assert_eq!(ctx.properties.get("plan").map(String::as_str), Some("pro"));
        assert!(ctx.current_time.is_some());
    }

    #[test]
    fn explicit_environment_wins() {
        let mut a = args();
        a.environment = Some("production".to_string());
        let ctx = a.context("cli", "default");
        assert_eq!(ctx.environment.as_deref(), Some("production"));
    }
}
