//! Secret detection and redaction utilities.
//!
//! Settings values such as provider API keys must never reach logs or
//! redacted CLI output in clear text. These helpers give every crate the same
//! notion of "secret".

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key/variable name likely refers to a secret.
///
/// Matching is case-insensitive and works for dotted settings paths as well
/// as environment variable names.
///
/// # Examples
///
/// ```
/// use search_settings_shared::is_secret_key;
///
/// assert!(is_secret_key("OPENAI_API_KEY"));
/// assert!(is_secret_key("MODELS.GROQ.API_KEY"));
/// assert!(!is_secret_key("KEEP_ALIVE"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASSWORD")
        || key.contains("CREDENTIAL")
        || key.contains("AUTH")
}

/// Redacts a value if the key is likely a secret.
///
/// Empty values stay empty so that "unset" remains visible.
///
/// # Examples
///
/// ```
/// use search_settings_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("GEMINI_API_KEY", "AIza-123"), "[REDACTED]");
/// assert_eq!(redact_if_secret("GEMINI_API_KEY", ""), "");
/// assert_eq!(redact_if_secret("SIMILARITY_MEASURE", "cosine"), "cosine");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) && !value.is_empty() {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// A secret string wrapper that redacts on Display/Debug.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the secret holds no characters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl AsRef<str> for SecretString {
    fn as_ref(&self) -> &str {
        self.expose()
    }
}

impl From<Box<str>> for SecretString {
    fn from(value: Box<str>) -> Self {
        Self(value)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}
