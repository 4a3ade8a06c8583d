//! Settings store boundary contract.
//!
//! A store owns one persisted settings document. The resolver never touches
//! the filesystem directly; it reads and writes text through this port so the
//! same logic runs against a real file or an in-memory double.

use search_settings_shared::Result;

/// Boundary contract for the persisted settings document.
pub trait ConfigStorePort: Send + Sync {
    /// Human-readable location of the store, used in logs and errors.
    fn describe(&self) -> String;

    /// Read the whole document.
    ///
    /// Returns `Ok(None)` when the store does not exist yet.
    fn read_text(&self) -> Result<Option<Box<str>>>;

    /// Replace the whole document.
    fn write_text(&self, contents: &str) -> Result<()>;

    /// Run `critical` while holding the store's exclusive write lock.
    ///
    /// The default runs `critical` without any locking; stores shared between
    /// writers must override it.
    fn with_exclusive_lock(&self, critical: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        critical()
    }
}
