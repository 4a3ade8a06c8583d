//! Structured JSON logger adapter.

use crate::log_sink::LogSink;
use search_settings_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use search_settings_shared::{REDACTED, is_secret_key};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const SERIALIZE_FAILED_LINE: &str = "{\"timestampMs\":0,\"level\":\"error\",\"event\":\"logger.serialize_failed\",\"message\":\"log serialization failed\"}\n";

/// JSON logger emitting one line per event.
///
/// Fields whose name looks like a secret (`apiKey`, `API_KEY`, `token`, ...)
/// are replaced with `[REDACTED]`, including inside nested objects.
#[derive(Clone)]
pub struct JsonLogger {
    sink: Arc<dyn LogSink>,
    base_fields: LogFields,
    min_level: LogLevel,
}

impl JsonLogger {
    /// Create a JSON logger backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_fields: LogFields::new(),
            min_level: LogLevel::Warn,
        }
    }

    /// Set base fields applied to every event.
    #[must_use]
    pub fn with_base_fields(mut self, fields: LogFields) -> Self {
        self.base_fields = fields;
        self
    }

    /// Set the minimum log level.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn render(&self, event: LogEvent) -> String {
        let mut fields = self.base_fields.clone();
        fields.extend(event.fields.unwrap_or_default());

        let mut payload = Map::new();
        payload.insert("timestampMs".to_string(), Value::from(now_epoch_ms()));
        payload.insert("level".to_string(), Value::from(event.level.as_str()));
        payload.insert("event".to_string(), Value::from(&*event.event));
        payload.insert("message".to_string(), Value::from(&*event.message));
        if !fields.is_empty() {
            let mut object: Map<String, Value> = fields
                .into_iter()
                .map(|(key, value)| (key.into_string(), value))
                .collect();
            redact_object(&mut object);
            payload.insert("fields".to_string(), Value::Object(object));
        }
        if let Some(mut error) = event.error {
            redact_value(&mut error);
            payload.insert("error".to_string(), error);
        }

        serde_json::to_string(&Value::Object(payload)).map_or_else(
            |_| SERIALIZE_FAILED_LINE.to_string(),
            |mut encoded| {
                encoded.push('\n');
                encoded
            },
        )
    }
}

impl LoggerPort for JsonLogger {
    fn log(&self, event: LogEvent) {
        if event.level < self.min_level {
            return;
        }
        let line = self.render(event);
        self.sink.write_line(&line);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            sink: Arc::clone(&self.sink),
            base_fields: merged,
            min_level: self.min_level,
        })
    }
}

fn redact_object(map: &mut Map<String, Value>) {
    for (key, nested) in map.iter_mut() {
        if is_secret_key(key) {
            *nested = Value::String(REDACTED.to_string());
        } else {
            redact_value(nested);
        }
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => redact_object(map),
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {},
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::MemoryLogSink;
    use search_settings_ports::log_fields;
    use serde_json::json;
    use std::error::Error;

    fn parse_single(sink: &MemoryLogSink) -> Result<Value, Box<dyn Error>> {
        let lines = sink.take();
        assert_eq!(lines.len(), 1);
        let line = lines.first().ok_or("missing line")?;
        assert!(line.ends_with('\n'));
        Ok(serde_json::from_str(line.trim())?)
    }

    #[test]
    fn secret_fields_are_redacted() -> Result<(), Box<dyn Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        let logger = JsonLogger::new(sink.clone()).with_min_level(LogLevel::Debug);

        logger.log(
            LogEvent::new(
                LogLevel::Warn,
                "config.store_malformed",
                "settings store is not valid TOML",
                Some(log_fields([
                    ("OPENAI_API_KEY", "sk-live"),
                    ("store", "config.toml"),
                ])),
            )
            .with_error(json!({ "nested": { "password": "nope", "line": 3 } })),
        );

        let payload = parse_single(&sink)?;
        assert_eq!(payload["level"], "warn");
        assert_eq!(payload["event"], "config.store_malformed");
        assert_eq!(payload["fields"]["OPENAI_API_KEY"], REDACTED);
        assert_eq!(payload["fields"]["store"], "config.toml");
        assert_eq!(payload["error"]["nested"]["password"], REDACTED);
        assert_eq!(payload["error"]["nested"]["line"], 3);
        Ok(())
    }

    #[test]
    fn events_below_the_minimum_level_are_dropped() {
        let sink = Arc::new(MemoryLogSink::default());
        let logger = JsonLogger::new(sink.clone());

        logger.debug("config.persisted", "persisted", None);
        logger.info("config.persisted", "persisted", None);
        logger.error("config.persist_failed", "failed", None);

        let lines = sink.take();
        assert_eq!(lines.len(), 1);
        assert!(lines.iter().all(|line| line.contains("config.persist_failed")));
    }

    #[test]
    fn child_logger_merges_fields() -> Result<(), Box<dyn Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        let logger = JsonLogger::new(sink.clone())
            .with_min_level(LogLevel::Info)
            .with_base_fields(log_fields([("command", "config show")]));

        let child = logger.child(log_fields([("store", "memory://config.toml")]));
        child.info("config.loaded", "loaded", Some(log_fields([("fields", 11)])));

        let payload = parse_single(&sink)?;
        assert_eq!(payload["fields"]["command"], "config show");
        assert_eq!(payload["fields"]["store"], "memory://config.toml");
        assert_eq!(payload["fields"]["fields"], 11);
        Ok(())
    }
}
