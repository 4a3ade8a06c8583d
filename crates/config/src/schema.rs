//! Settings schema and the field table that describes its shape.
//!
//! Every leaf is a string; an unset value is the empty string. The
//! [`ConfigField`] table is the single source of truth for leaf paths, the
//! environment variable that overrides each leaf, and which leaves are
//! secrets. Merge decisions ([`shape_of`]) are derived from it.

use crate::env::{
    ENV_ANTHROPIC_API_KEY, ENV_CUSTOM_OPENAI_API_KEY, ENV_CUSTOM_OPENAI_API_URL,
    ENV_CUSTOM_OPENAI_MODEL_NAME, ENV_GEMINI_API_KEY, ENV_GROQ_API_KEY, ENV_KEEP_ALIVE,
    ENV_OLLAMA_API_URL, ENV_OPENAI_API_KEY, ENV_SEARXNG_API_URL, ENV_SIMILARITY_MEASURE,
};
use search_settings_shared::{ErrorCode, ErrorEnvelope, REDACTED};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Default file name of the persisted settings store.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Fully populated settings record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Model provider credentials and endpoints.
    pub models: ModelsConfig,
    /// External service endpoints.
    pub api_endpoints: ApiEndpointsConfig,
}

/// `GENERAL` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct GeneralConfig {
    /// Vector similarity measure name (e.g. `cosine`).
    pub similarity_measure: String,
    /// Keep-alive duration passed to local model servers.
    pub keep_alive: String,
}

/// `MODELS` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ModelsConfig {
    /// OpenAI credentials.
    pub openai: ApiKeyProvider,
    /// Groq credentials.
    pub groq: ApiKeyProvider,
    /// Anthropic credentials.
    pub anthropic: ApiKeyProvider,
    /// Gemini credentials.
    pub gemini: ApiKeyProvider,
    /// Ollama endpoint.
    pub ollama: ApiUrlProvider,
    /// OpenAI-compatible custom endpoint.
    pub custom_openai: CustomOpenAiProvider,
}

/// Provider authenticated by an API key only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ApiKeyProvider {
    /// Secret API key.
    pub api_key: String,
}

/// Provider reached through a base URL only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ApiUrlProvider {
    /// Base URL.
    pub api_url: String,
}

/// OpenAI-compatible provider with its own URL, key, and model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct CustomOpenAiProvider {
    /// Base URL.
    pub api_url: String,
    /// Secret API key.
    pub api_key: String,
    /// Model identifier.
    pub model_name: String,
}

/// `API_ENDPOINTS` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ApiEndpointsConfig {
    /// `SearxNG` metasearch endpoint.
    pub searxng: String,
}

impl Config {
    /// Returns a copy safe to print: non-empty secrets are replaced with
    /// [`REDACTED`] and credentials embedded in URLs are stripped.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        for field in ConfigField::ALL {
            let value = field.get_mut(&mut redacted);
            if value.is_empty() {
                continue;
            }
            if field.is_secret() {
                *value = REDACTED.to_string();
            } else if field.is_url() {
                *value = strip_url_credentials(value);
            }
        }
        redacted
    }

    /// Returns true when every leaf is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        ConfigField::ALL.iter().all(|field| field.get(self).is_empty())
    }
}

fn strip_url_credentials(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };
    if parsed.password().is_none() && parsed.username().is_empty() {
        return raw.to_string();
    }
    if parsed.set_username("").is_err() || parsed.set_password(None).is_err() {
        return REDACTED.to_string();
    }
    parsed.to_string()
}

/// One leaf of the settings schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigField {
    /// `GENERAL.SIMILARITY_MEASURE`
    SimilarityMeasure,
    /// `GENERAL.KEEP_ALIVE`
    KeepAlive,
    /// `MODELS.OPENAI.API_KEY`
    OpenaiApiKey,
    /// `MODELS.GROQ.API_KEY`
    GroqApiKey,
    /// `MODELS.ANTHROPIC.API_KEY`
    AnthropicApiKey,
    /// `MODELS.GEMINI.API_KEY`
    GeminiApiKey,
    /// `MODELS.OLLAMA.API_URL`
    OllamaApiUrl,
    /// `MODELS.CUSTOM_OPENAI.API_URL`
    CustomOpenaiApiUrl,
    /// `MODELS.CUSTOM_OPENAI.API_KEY`
    CustomOpenaiApiKey,
    /// `MODELS.CUSTOM_OPENAI.MODEL_NAME`
    CustomOpenaiModelName,
    /// `API_ENDPOINTS.SEARXNG`
    SearxngApiEndpoint,
}

impl ConfigField {
    /// Every leaf, in document order.
    pub const ALL: [Self; 11] = [
        Self::SimilarityMeasure,
        Self::KeepAlive,
        Self::OpenaiApiKey,
        Self::GroqApiKey,
        Self::AnthropicApiKey,
        Self::GeminiApiKey,
        Self::OllamaApiUrl,
        Self::CustomOpenaiApiUrl,
        Self::CustomOpenaiApiKey,
        Self::CustomOpenaiModelName,
        Self::SearxngApiEndpoint,
    ];

    /// Path segments from the document root to the leaf.
    #[must_use]
    pub const fn path(self) -> &'static [&'static str] {
        match self {
            Self::SimilarityMeasure => &["GENERAL", "SIMILARITY_MEASURE"],
            Self::KeepAlive => &["GENERAL", "KEEP_ALIVE"],
            Self::OpenaiApiKey => &["MODELS", "OPENAI", "API_KEY"],
            Self::GroqApiKey => &["MODELS", "GROQ", "API_KEY"],
            Self::AnthropicApiKey => &["MODELS", "ANTHROPIC", "API_KEY"],
            Self::GeminiApiKey => &["MODELS", "GEMINI", "API_KEY"],
            Self::OllamaApiUrl => &["MODELS", "OLLAMA", "API_URL"],
            Self::CustomOpenaiApiUrl => &["MODELS", "CUSTOM_OPENAI", "API_URL"],
            Self::CustomOpenaiApiKey => &["MODELS", "CUSTOM_OPENAI", "API_KEY"],
            Self::CustomOpenaiModelName => &["MODELS", "CUSTOM_OPENAI", "MODEL_NAME"],
            Self::SearxngApiEndpoint => &["API_ENDPOINTS", "SEARXNG"],
        }
    }

    /// Dotted path, e.g. `MODELS.OPENAI.API_KEY`.
    #[must_use]
    pub fn key(self) -> String {
        self.path().join(".")
    }

    /// Environment variable that overrides this leaf.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::SimilarityMeasure => ENV_SIMILARITY_MEASURE,
            Self::KeepAlive => ENV_KEEP_ALIVE,
            Self::OpenaiApiKey => ENV_OPENAI_API_KEY,
            Self::GroqApiKey => ENV_GROQ_API_KEY,
            Self::AnthropicApiKey => ENV_ANTHROPIC_API_KEY,
            Self::GeminiApiKey => ENV_GEMINI_API_KEY,
            Self::OllamaApiUrl => ENV_OLLAMA_API_URL,
            Self::CustomOpenaiApiUrl => ENV_CUSTOM_OPENAI_API_URL,
            Self::CustomOpenaiApiKey => ENV_CUSTOM_OPENAI_API_KEY,
            Self::CustomOpenaiModelName => ENV_CUSTOM_OPENAI_MODEL_NAME,
            Self::SearxngApiEndpoint => ENV_SEARXNG_API_URL,
        }
    }

    /// Whether the leaf holds a credential.
    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(
            self,
            Self::OpenaiApiKey
                | Self::GroqApiKey
                | Self::AnthropicApiKey
                | Self::GeminiApiKey
                | Self::CustomOpenaiApiKey
        )
    }

    /// Whether the leaf holds a URL.
    #[must_use]
    pub const fn is_url(self) -> bool {
        matches!(
            self,
            Self::OllamaApiUrl | Self::CustomOpenaiApiUrl | Self::SearxngApiEndpoint
        )
    }

    /// Borrow the leaf value.
    #[must_use]
    pub fn get(self, config: &Config) -> &str {
        match self {
            Self::SimilarityMeasure => &config.general.similarity_measure,
            Self::KeepAlive => &config.general.keep_alive,
            Self::OpenaiApiKey => &config.models.openai.api_key,
            Self::GroqApiKey => &config.models.groq.api_key,
            Self::AnthropicApiKey => &config.models.anthropic.api_key,
            Self::GeminiApiKey => &config.models.gemini.api_key,
            Self::OllamaApiUrl => &config.models.ollama.api_url,
            Self::CustomOpenaiApiUrl => &config.models.custom_openai.api_url,
            Self::CustomOpenaiApiKey => &config.models.custom_openai.api_key,
            Self::CustomOpenaiModelName => &config.models.custom_openai.model_name,
            Self::SearxngApiEndpoint => &config.api_endpoints.searxng,
        }
    }

    /// Mutably borrow the leaf value.
    pub fn get_mut(self, config: &mut Config) -> &mut String {
        match self {
            Self::SimilarityMeasure => &mut config.general.similarity_measure,
            Self::KeepAlive => &mut config.general.keep_alive,
            Self::OpenaiApiKey => &mut config.models.openai.api_key,
            Self::GroqApiKey => &mut config.models.groq.api_key,
            Self::AnthropicApiKey => &mut config.models.anthropic.api_key,
            Self::GeminiApiKey => &mut config.models.gemini.api_key,
            Self::OllamaApiUrl => &mut config.models.ollama.api_url,
            Self::CustomOpenaiApiUrl => &mut config.models.custom_openai.api_url,
            Self::CustomOpenaiApiKey => &mut config.models.custom_openai.api_key,
            Self::CustomOpenaiModelName => &mut config.models.custom_openai.model_name,
            Self::SearxngApiEndpoint => &mut config.api_endpoints.searxng,
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.key())
    }
}

impl FromStr for ConfigField {
    type Err = ErrorEnvelope;

    /// Accepts a dotted path (`models.openai.api_key`) or an env var name
    /// (`OPENAI_API_KEY`), case-insensitively.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|field| field.key() == wanted || field.env_var() == wanted)
            .ok_or_else(|| {
                ErrorEnvelope::expected(
                    ErrorCode::new("config", "unknown_field"),
                    format!("unknown settings field: {input}"),
                )
                .with_metadata("field", input)
            })
    }
}

/// How the merge treats a document path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A record whose keys merge recursively.
    Section,
    /// A value that is replaced outright.
    Leaf,
}

/// Classify a document path using the field table.
///
/// The empty path is the root section. Paths the table does not know return
/// `None`.
pub fn shape_of<S: AsRef<str>>(path: &[S]) -> Option<Shape> {
    let mut shape = None;
    for field in ConfigField::ALL {
        let declared = field.path();
        if declared.len() < path.len() {
            continue;
        }
        let is_prefix = declared
            .iter()
            .zip(path)
            .all(|(declared, segment)| *declared == segment.as_ref());
        if !is_prefix {
            continue;
        }
        if declared.len() == path.len() {
            return Some(Shape::Leaf);
        }
        shape = Some(Shape::Section);
    }
    shape
}
