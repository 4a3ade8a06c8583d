//! # search-settings-adapters
//!
//! Adapter implementations for the ports crate:
//!
//! - [`FileConfigStore`]: the TOML settings file, with a sidecar file lock
//! - [`ProcessEnv`]: the process environment
//! - [`JsonLogger`] and [`TracingLogger`]: structured logging
//!
//! This crate depends on `ports`, `shared`, and `config`.

pub mod file_store;
pub mod log_sink;
pub mod logger;
pub mod process_env;
pub mod tracing_logger;

pub use file_store::FileConfigStore;
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use process_env::ProcessEnv;
pub use tracing_logger::TracingLogger;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
