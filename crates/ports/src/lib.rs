//! # search-settings-ports
//!
//! Port traits for the search-settings hexagonal architecture.
//!
//! This crate defines the boundaries between the resolver and the outside
//! world: the persisted settings store, the environment, and logging. It
//! depends only on `shared`.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod env;
pub mod logger;
pub mod store;

pub use env::*;
pub use logger::*;
pub use store::*;
