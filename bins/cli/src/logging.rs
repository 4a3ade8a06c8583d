//! Logger selection for the CLI process.
//!
//! By default events go through `tracing` with a stderr fmt subscriber
//! filtered by `SEARCH_SETTINGS_LOG` (default `warn`). Setting
//! `SEARCH_SETTINGS_LOG_FORMAT=json` switches to one JSON line per event,
//! filtered by `SEARCH_SETTINGS_LOG_LEVEL`.

use search_settings_adapters::{JsonLogger, StderrLogSink, TracingLogger};
use search_settings_ports::{EnvSourcePort, LogLevel, LoggerPort};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub const ENV_LOG_FILTER: &str = "SEARCH_SETTINGS_LOG";
pub const ENV_LOG_FORMAT: &str = "SEARCH_SETTINGS_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "SEARCH_SETTINGS_LOG_LEVEL";

const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSettings {
    Tracing { filter: String },
    Json { level: LogLevel },
}

impl LogSettings {
    pub fn from_env(env: &dyn EnvSourcePort) -> Self {
        let non_empty = |name: &str| env.var(name).filter(|value| !value.trim().is_empty());

        let json = non_empty(ENV_LOG_FORMAT)
            .is_some_and(|format| format.trim().eq_ignore_ascii_case("json"));
        if json {
            let level = non_empty(ENV_LOG_LEVEL)
                .and_then(|level| level.parse().ok())
                .unwrap_or(LogLevel::Warn);
            return Self::Json { level };
        }

        Self::Tracing {
            filter: non_empty(ENV_LOG_FILTER).unwrap_or_else(|| DEFAULT_FILTER.to_string()),
        }
    }

    pub fn install(&self) -> Arc<dyn LoggerPort> {
        match self {
            Self::Json { level } => {
                Arc::new(JsonLogger::new(Arc::new(StderrLogSink)).with_min_level(*level))
            },
            Self::Tracing { filter } => {
                let filter =
                    EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
                // Keep a subscriber that is already installed.
                let _ = tracing_subscriber::registry()
                    .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                    .with(filter)
                    .try_init();
                Arc::new(TracingLogger::new())
            },
        }
    }
}
