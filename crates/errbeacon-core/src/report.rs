//! Report payloads
//!
//! A [`ReportPayload`] is the immutable unit of capture: what happened, at
//! which severity, plus the scope snapshot taken at capture time. The
//! payload knows how to render itself as the remote service's event JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::DeliveryConfig;
use crate::scope::ScopeSnapshot;
use crate::severity::Severity;

/// What kind of occurrence a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// A typed error with a class/type label
    Exception,
    /// A free-form log message
    Message,
    /// The host runtime's final recorded error, read back after the fact
    LastError,
}

/// Normalized capture unit handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPayload {
    pub kind: ReportKind,
    /// Error class label, present for [`ReportKind::Exception`].
    pub error_type: Option<String>,
    pub message: String,
    pub level: Severity,
    pub timestamp: DateTime<Utc>,
    pub scope: ScopeSnapshot,
    pub extra: Map<String, Value>,
}

impl ReportPayload {
    pub fn exception(
        error_type: impl Into<String>,
        message: impl Into<String>,
        scope: ScopeSnapshot,
    ) -> Self {
        ReportPayload {
            kind: ReportKind::Exception,
            error_type: Some(error_type.into()),
            message: message.into(),
            level: Severity::Error,
            timestamp: Utc::now(),
            scope,
            extra: Map::new(),
        }
    }

    pub fn message(level: Severity, message: impl Into<String>, scope: ScopeSnapshot) -> Self {
        ReportPayload {
            kind: ReportKind::Message,
            error_type: None,
            message: message.into(),
            level,
            timestamp: Utc::now(),
            scope,
            extra: Map::new(),
        }
    }

    pub fn last_error(level: Severity, message: impl Into<String>, scope: ScopeSnapshot) -> Self {
        ReportPayload {
            kind: ReportKind::LastError,
            error_type: None,
            message: message.into(),
            level,
            timestamp: Utc::now(),
            scope,
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    /// Renders the payload as an event document for the remote ingest API.
    pub fn to_event(&self, config: &DeliveryConfig) -> Value {
        let mut event = Map::new();
        event.insert(
            "event_id".into(),
            Value::String(Uuid::new_v4().simple().to_string()),
        );
        event.insert(
            "timestamp".into(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        event.insert("platform".into(), Value::String("other".into()));
        event.insert("logger".into(), Value::String("errbeacon".into()));
        event.insert("level".into(), Value::String(self.level.as_str().into()));

        let mut sdk = Map::new();
        sdk.insert("name".into(), Value::String("errbeacon".into()));
        sdk.insert(
            "version".into(),
            Value::String(env!("CARGO_PKG_VERSION").into()),
        );
        event.insert("sdk".into(), Value::Object(sdk));

        let mut message = Map::new();
        message.insert("formatted".into(), Value::String(self.message.clone()));
        event.insert("message".into(), Value::Object(message));

        if let Some(environment) = &config.environment {
            event.insert("environment".into(), Value::String(environment.clone()));
        }
        if let Some(release) = &config.release {
            event.insert("release".into(), Value::String(release.clone()));
        }
        if let Some(server_name) = &config.server_name {
            event.insert("server_name".into(), Value::String(server_name.clone()));
        }

        if self.kind == ReportKind::Exception {
            let mut exception = Map::new();
            exception.insert(
                "type".into(),
                Value::String(self.error_type.clone().unwrap_or_else(|| "Error".into())),
            );
            exception.insert("value".into(), Value::String(self.message.clone()));
            let mut exceptions = Map::new();
            exceptions.insert(
                "values".into(),
                Value::Array(vec![Value::Object(exception)]),
            );
            event.insert("exception".into(), Value::Object(exceptions));
        }

        if !self.scope.breadcrumbs.is_empty() {
            let crumbs: Vec<Value> = self
                .scope
                .breadcrumbs
                .iter()
                .filter_map(|c| serde_json::to_value(c).ok())
                .collect();
            let mut breadcrumbs = Map::new();
            breadcrumbs.insert("values".into(), Value::Array(crumbs));
            event.insert("breadcrumbs".into(), Value::Object(breadcrumbs));
        }

        if !self.scope.contexts.is_empty() {
            let mut contexts = Map::new();
            for (name, block) in &self.scope.contexts {
                contexts.insert(name.clone(), Value::Object(block.clone()));
            }
            event.insert("contexts".into(), Value::Object(contexts));
        }

        if let Some(user) = &self.scope.user {
            if let Ok(user) = serde_json::to_value(user) {
                event.insert("user".into(), user);
            }
        }

        if !self.extra.is_empty() {
            event.insert("extra".into(), Value::Object(self.extra.clone()));
        }

        Value::Object(event)
    }
}
