//! # search-settings-config
//!
//! Settings schema, environment overrides, schema-aware deep merge, and the
//! resolver that ties them to a store. This crate depends on `ports` and
//! `shared` only.

/// Environment variable names and the env override layer.
pub mod env;
/// Parsing, projection, and serialization of the persisted document.
pub mod load;
/// Deep merge of partial updates.
pub mod merge;
/// Resolver combining the store and the environment.
pub mod resolver;
/// Settings schema and field table.
pub mod schema;

pub use env::{
    ENV_ANTHROPIC_API_KEY, ENV_CUSTOM_OPENAI_API_KEY, ENV_CUSTOM_OPENAI_API_URL,
    ENV_CUSTOM_OPENAI_MODEL_NAME, ENV_GEMINI_API_KEY, ENV_GROQ_API_KEY, ENV_KEEP_ALIVE,
    ENV_OLLAMA_API_URL, ENV_OPENAI_API_KEY, ENV_SEARXNG_API_URL, ENV_SIMILARITY_MEASURE,
    SettingsEnv, apply_env_overrides,
};
pub use load::{
    SchemaIssue, SchemaIssueKind, document_from_config, parse_document, project_document,
    to_pretty_json, to_pretty_toml,
};
pub use merge::{
    ApiEndpointsPatch, ApiKeyPatch, ApiUrlPatch, ConfigPatch, CustomOpenAiPatch, GeneralPatch,
    ModelsPatch, deep_merge, json_to_toml,
};
pub use resolver::{ConfigResolver, FieldReport, FieldSource};
pub use schema::{
    ApiEndpointsConfig, ApiKeyProvider, ApiUrlProvider, CONFIG_FILE_NAME, Config, ConfigField,
    CustomOpenAiProvider, GeneralConfig, ModelsConfig, Shape, shape_of,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
