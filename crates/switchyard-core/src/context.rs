use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Everything a toggle can be evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl Context {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Look up a field by the name used in constraints and stickiness settings.
    ///
    /// `currentTime` falls back to the present moment. Unknown names are
    /// looked up in `properties`.
    pub fn by_name(&self, name: &str) -> Option<Cow<'_, str>> {
        let field = match name {
            "environment" => self.environment.as_deref(),
            "appName" => self.app_name.as_deref(),
            "userId" => self.user_id.as_deref(),
            "sessionId" => self.session_id.as_deref(),
            "remoteAddress" => self.remote_address.as_deref(),
            "currentTime" => {
                let at = self.current_time.unwrap_or_else(Utc::now);
                return Some(Cow::Owned(at.to_rfc3339_opts(SecondsFormat::Millis, true)));
            }
            other => self.properties.get(other).map(String::as_str),
        };
        field.map(Cow::Borrowed)
    }

    /// Fill `appName` and `environment` from the client config where the
    /// caller left them unset.
    pub fn apply_static_fields(&self, app_name: &str, environment: &str) -> Context {
        let mut ctx = self.clone();
        if ctx.app_name.is_none() {
            ctx.app_name = Some(app_name.to_string());
        }
        if ctx.environment.is_none() {
            ctx.environment = Some(environment.to_string());
        }
        ctx
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    ctx: Context,
}

impl ContextBuilder {
    pub fn app_name(mut self, value: impl Into<String>) -> Self {
        self.ctx.app_name = Some(value.into());
        self
    }

    pub fn environment(mut self, value: impl Into<String>) -> Self {
        self.ctx.environment = Some(value.into());
        self
    }

    pub fn user_id(mut self, value: impl Into<String>) -> Self {
        self.ctx.user_id = Some(value.into());
        self
    }

    pub fn session_id(mut self, value: impl Into<String>) -> Self {
        self.ctx.session_id = Some(value.into());
        self
    }

    pub fn remote_address(mut self, value: impl Into<String>) -> Self {
        self.ctx.remote_address = Some(value.into());
        self
    }

    pub fn current_time(mut self, value: DateTime<Utc>) -> Self {
        self.ctx.current_time = Some(value);
        self
    }

    pub fn now(self) -> Self {
        self.current_time(Utc::now())
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.properties.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Context {
        self.ctx
    }
}
