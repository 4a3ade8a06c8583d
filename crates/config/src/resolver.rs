//! Settings resolver: persisted base + environment overrides.
//!
//! The resolver holds no cached state. Every read goes back to the store and
//! the env source, so a change made by another process is visible on the next
//! call. Reads never fail: a missing, unreadable, or malformed store resolves
//! to the all-empty configuration and a warning is logged.

use crate::env::{SettingsEnv, apply_env_overrides};
use crate::load::{document_from_config, parse_document, project_document, to_pretty_toml};
use crate::merge::{ConfigPatch, deep_merge};
use crate::schema::{Config, ConfigField};
use search_settings_ports::{ConfigStorePort, EnvSourcePort, LoggerPort, log_fields};
use search_settings_shared::{ErrorCode, ErrorEnvelope, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Where the effective value of a field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    /// A non-empty environment variable.
    Env,
    /// The persisted store.
    File,
    /// Neither; the value is empty.
    Unset,
}

impl FieldSource {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::File => "file",
            Self::Unset => "unset",
        }
    }
}

impl fmt::Display for FieldSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Effective value of one field and its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    /// The field.
    pub field: ConfigField,
    /// Effective value (not redacted).
    pub value: String,
    /// Origin of the value.
    pub source: FieldSource,
}

/// Combines the persisted store with environment overrides.
#[derive(Clone)]
pub struct ConfigResolver {
    store: Arc<dyn ConfigStorePort>,
    env: Arc<dyn EnvSourcePort>,
    logger: Option<Arc<dyn LoggerPort>>,
}

impl ConfigResolver {
    /// Create a resolver over a store and an env source.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStorePort>, env: Arc<dyn EnvSourcePort>) -> Self {
        Self {
            store,
            env,
            logger: None,
        }
    }

    /// Attach a logger for recovery warnings and persistence events.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Location of the underlying store.
    #[must_use]
    pub fn store_location(&self) -> String {
        self.store.describe()
    }

    /// Read and project the persisted configuration.
    ///
    /// Never fails; see the module docs for the fallback.
    #[must_use]
    pub fn load_base(&self) -> Config {
        let (config, issues) = project_document(&self.load_document());
        for issue in issues {
            self.warn(
                issue.kind.event(),
                &issue.to_string(),
                &[("path", issue.path.clone()), ("found", issue.found.to_string())],
            );
        }
        config
    }

    /// Overrides currently present in the env source.
    #[must_use]
    pub fn env_overrides(&self) -> SettingsEnv {
        SettingsEnv::from_source(self.env.as_ref())
    }

    /// Effective configuration: per field, a non-empty env value wins over
    /// the persisted value.
    #[must_use]
    pub fn resolve_effective(&self) -> Config {
        apply_env_overrides(self.load_base(), &self.env_overrides())
    }

    /// Effective value of one field.
    #[must_use]
    pub fn get(&self, field: ConfigField) -> String {
        let env = self.env_overrides();
        match env.value_for(field) {
            Some(value) => value.to_owned(),
            None => field.get(&self.load_base()).to_owned(),
        }
    }

    /// Effective `GENERAL.SIMILARITY_MEASURE`.
    #[must_use]
    pub fn similarity_measure(&self) -> String {
        self.get(ConfigField::SimilarityMeasure)
    }

    /// Effective `GENERAL.KEEP_ALIVE`.
    #[must_use]
    pub fn keep_alive(&self) -> String {
        self.get(ConfigField::KeepAlive)
    }

    /// Effective `MODELS.OPENAI.API_KEY`.
    #[must_use]
    pub fn openai_api_key(&self) -> String {
        self.get(ConfigField::OpenaiApiKey)
    }

    /// Effective `MODELS.GROQ.API_KEY`.
    #[must_use]
    pub fn groq_api_key(&self) -> String {
        self.get(ConfigField::GroqApiKey)
    }

    /// Effective `MODELS.ANTHROPIC.API_KEY`.
    #[must_use]
    pub fn anthropic_api_key(&self) -> String {
        self.get(ConfigField::AnthropicApiKey)
    }

    /// Effective `MODELS.GEMINI.API_KEY`.
    #[must_use]
    pub fn gemini_api_key(&self) -> String {
        self.get(ConfigField::GeminiApiKey)
    }

    /// Effective `API_ENDPOINTS.SEARXNG`.
    #[must_use]
    pub fn searxng_api_endpoint(&self) -> String {
        self.get(ConfigField::SearxngApiEndpoint)
    }

    /// Effective `MODELS.OLLAMA.API_URL`.
    #[must_use]
    pub fn ollama_api_endpoint(&self) -> String {
        self.get(ConfigField::OllamaApiUrl)
    }

    /// Effective `MODELS.CUSTOM_OPENAI.API_KEY`.
    #[must_use]
    pub fn custom_openai_api_key(&self) -> String {
        self.get(ConfigField::CustomOpenaiApiKey)
    }

    /// Effective `MODELS.CUSTOM_OPENAI.API_URL`.
    #[must_use]
    pub fn custom_openai_api_url(&self) -> String {
        self.get(ConfigField::CustomOpenaiApiUrl)
    }

    /// Effective `MODELS.CUSTOM_OPENAI.MODEL_NAME`.
    #[must_use]
    pub fn custom_openai_model_name(&self) -> String {
        self.get(ConfigField::CustomOpenaiModelName)
    }

    /// Origin of the effective value of one field.
    #[must_use]
    pub fn source_of(&self, field: ConfigField) -> FieldSource {
        classify(field, &self.env_overrides(), &self.load_base())
    }

    /// Effective value and origin of every field, from a single read.
    #[must_use]
    pub fn field_reports(&self) -> Vec<FieldReport> {
        let env = self.env_overrides();
        let base = self.load_base();
        ConfigField::ALL
            .into_iter()
            .map(|field| FieldReport {
                field,
                value: env
                    .value_for(field)
                    .unwrap_or_else(|| field.get(&base))
                    .to_owned(),
                source: classify(field, &env, &base),
            })
            .collect()
    }

    /// Deep-merge a partial update into the persisted store.
    ///
    /// Runs read-merge-write under the store's exclusive lock. When the
    /// current store cannot be loaded, the update is applied to the all-empty
    /// document, which then replaces the store. Write and serialization
    /// failures propagate.
    pub fn persist_update(&self, update: &Value) -> Result<()> {
        let result = self.store.with_exclusive_lock(&mut || {
            let merged = deep_merge(&self.load_document(), update);
            let text = to_pretty_toml(&merged)?;
            self.store.write_text(&text)
        });

        match &result {
            Ok(()) => self.debug(
                "config.persisted",
                "settings update persisted",
                &[("store", self.store.describe())],
            ),
            Err(error) => self.error(
                "config.persist_failed",
                "settings update failed",
                &[
                    ("store", self.store.describe()),
                    ("code", error.code.to_string()),
                ],
            ),
        }
        result
    }

    /// Persist a typed partial update.
    pub fn persist_patch(&self, patch: &ConfigPatch) -> Result<()> {
        self.persist_update(&patch.to_json()?)
    }

    /// Persist a partial update given as JSON text.
    ///
    /// The payload must be a JSON object.
    pub fn persist_update_json(&self, input: &str) -> Result<()> {
        let update: Value = serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid settings update JSON: {error}"),
            )
            .with_metadata("source", "update")
        })?;
        if !update.is_object() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "settings update must be a JSON object",
            )
            .with_metadata("source", "update"));
        }
        self.persist_update(&update)
    }

    fn load_document(&self) -> toml::Table {
        let location = self.store.describe();
        match self.store.read_text() {
            Ok(Some(text)) => match parse_document(&text) {
                Ok(document) => return document,
                Err(error) => self.warn(
                    "config.store_malformed",
                    "settings store is not valid TOML; using empty settings",
                    &[("store", location), ("error", error.message)],
                ),
            },
            Ok(None) => self.warn(
                "config.store_missing",
                "settings store not found; using empty settings",
                &[("store", location)],
            ),
            Err(error) => self.warn(
                "config.store_unreadable",
                "settings store could not be read; using empty settings",
                &[
                    ("store", location),
                    ("code", error.code.to_string()),
                    ("error", error.message),
                ],
            ),
        }
        document_from_config(&Config::default())
    }

    fn warn(&self, event: &str, message: &str, fields: &[(&str, String)]) {
        if let Some(logger) = &self.logger {
            logger.warn(event, message, Some(log_fields(fields.iter().cloned())));
        }
    }

    fn debug(&self, event: &str, message: &str, fields: &[(&str, String)]) {
        if let Some(logger) = &self.logger {
            logger.debug(event, message, Some(log_fields(fields.iter().cloned())));
        }
    }

    fn error(&self, event: &str, message: &str, fields: &[(&str, String)]) {
        if let Some(logger) = &self.logger {
            logger.error(event, message, Some(log_fields(fields.iter().cloned())));
        }
    }
}

impl fmt::Debug for ConfigResolver {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConfigResolver")
            .field("store", &self.store.describe())
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

fn classify(field: ConfigField, env: &SettingsEnv, base: &Config) -> FieldSource {
    if env.value_for(field).is_some() {
        FieldSource::Env
    } else if field.get(base).is_empty() {
        FieldSource::Unset
    } else {
        FieldSource::File
    }
}
