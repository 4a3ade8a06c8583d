//! Logger adapter forwarding events to `tracing`.
//!
//! Event fields are flattened into a single JSON-encoded `fields` value since
//! `tracing` field names are fixed at compile time.

use search_settings_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use search_settings_shared::redact_if_secret;
use serde_json::Value;

/// Forwards log events to the active `tracing` subscriber.
#[derive(Debug, Default, Clone)]
pub struct TracingLogger {
    base_fields: LogFields,
}

impl TracingLogger {
    /// Logger without base fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoggerPort for TracingLogger {
    fn log(&self, event: LogEvent) {
        let mut fields = self.base_fields.clone();
        fields.extend(event.fields.unwrap_or_default());
        let fields = render_fields(&fields);
        let error = event.error.map(|error| error.to_string()).unwrap_or_default();
        let name = &*event.event;
        let message = &*event.message;

        match event.level {
            LogLevel::Debug => {
                tracing::debug!(event = name, fields = %fields, error = %error, "{message}");
            },
            LogLevel::Info => {
                tracing::info!(event = name, fields = %fields, error = %error, "{message}");
            },
            LogLevel::Warn => {
                tracing::warn!(event = name, fields = %fields, error = %error, "{message}");
            },
            LogLevel::Error => {
                tracing::error!(event = name, fields = %fields, error = %error, "{message}");
            },
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base_fields = self.base_fields.clone();
        base_fields.extend(fields);
        Box::new(Self { base_fields })
    }
}

fn render_fields(fields: &LogFields) -> String {
    let object: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => Value::String(redact_if_secret(key, text)),
                other => other.clone(),
            };
            (key.to_string(), value)
        })
        .collect();
    Value::Object(object).to_string()
}
