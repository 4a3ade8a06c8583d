//! Environment source boundary contract.

/// Read-only source of override variables.
pub trait EnvSourcePort: Send + Sync {
    /// Look up a variable by name.
    ///
    /// Returns `None` when unset or when the value is not valid UTF-8.
    fn var(&self, name: &str) -> Option<String>;
}
