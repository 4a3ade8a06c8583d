//! Test fixtures for shared error codes and envelopes.

use search_settings_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Return a list of common error codes used in tests.
pub fn common_error_codes() -> Vec<ErrorCode> {
    vec![
        ErrorCode::invalid_input(),
        ErrorCode::not_found(),
        ErrorCode::permission_denied(),
        ErrorCode::io(),
        ErrorCode::internal(),
        ErrorCode::new("config", "write_failed"),
        ErrorCode::new("config", "serialize_toml"),
    ]
}

/// An invalid input error fixture.
pub fn invalid_input_error() -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::invalid_input(), "invalid input")
}

/// A store read failure, as a permission problem on the settings file.
pub fn store_read_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::permission_denied(),
        "settings store is not readable",
        ErrorClass::NonRetriable,
    )
}

/// A store write failure.
pub fn store_write_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("config", "write_failed"),
        "settings store is read-only",
        ErrorClass::NonRetriable,
    )
    .with_metadata("store", "memory://config.toml")
}
