//! Environment source reading the current process environment.

use search_settings_ports::EnvSourcePort;

/// Reads variables from `std::env` on every lookup.
///
/// Variables that are unset or not valid Unicode read as absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSourcePort for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}
