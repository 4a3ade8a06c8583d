//! Access to the settings fixture files shipped with this crate.

use std::path::{Path, PathBuf};

/// Directory holding the settings fixtures.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("config")
}

/// Path of one settings fixture, e.g. `settings.valid.toml`.
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Read one settings fixture.
pub fn read_fixture(name: &str) -> std::io::Result<String> {
    std::fs::read_to_string(fixture_path(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_are_present() -> std::io::Result<()> {
        for name in [
            "settings.valid.toml",
            "settings.partial.toml",
            "settings.mistyped.toml",
            "settings.malformed.toml",
        ] {
            assert!(!read_fixture(name)?.is_empty(), "{name} should not be empty");
        }
        Ok(())
    }
}
