//! Schema-aware deep merge of partial updates into a persisted document.
//!
//! The base is the raw TOML document (extra keys included); the update is an
//! untyped JSON value. Rules per key of the update:
//! - `null` keeps the base value;
//! - a path the field table declares a leaf is replaced outright;
//! - a declared section merges an object update into the base section, treating
//!   a non-table base as empty;
//! - unknown paths merge when both sides are records and replace otherwise.

use crate::schema::{ConfigField, Shape, shape_of};
use search_settings_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use toml::Table;

/// Merge `update` into a copy of `base`.
///
/// Neither input is mutated. A top-level update that is not an object leaves
/// the base unchanged.
#[must_use]
pub fn deep_merge(base: &Table, update: &Value) -> Table {
    let Value::Object(update) = update else {
        return base.clone();
    };
    let mut path = Vec::new();
    merge_table(base, update, &mut path)
}

fn merge_table(base: &Table, update: &Map<String, Value>, path: &mut Vec<String>) -> Table {
    let mut merged = base.clone();
    for (key, value) in update {
        if value.is_null() {
            continue;
        }
        path.push(key.clone());
        let next = match (shape_of(path), value) {
            (Some(Shape::Leaf), _) => json_to_toml(value),
            (Some(Shape::Section), Value::Object(nested)) => {
                let empty = Table::new();
                let section = base
                    .get(key)
                    .and_then(toml::Value::as_table)
                    .unwrap_or(&empty);
                Some(toml::Value::Table(merge_table(section, nested, path)))
            },
            (None, Value::Object(nested)) => match base.get(key) {
                Some(toml::Value::Table(section)) => {
                    Some(toml::Value::Table(merge_table(section, nested, path)))
                },
                _ => json_to_toml(value),
            },
            _ => json_to_toml(value),
        };
        path.pop();
        if let Some(next) = next {
            merged.insert(key.clone(), next);
        }
    }
    merged
}

/// Convert a JSON value into TOML, pruning nulls (TOML has no null).
///
/// Returns `None` for a bare `null`. Integers above `i64::MAX` do not fit a
/// TOML integer and are kept as their decimal string instead of a lossy float.
#[must_use]
pub fn json_to_toml(value: &Value) -> Option<toml::Value> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(toml::Value::Boolean(*flag)),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Some(toml::Value::Integer(integer))
            } else if number.is_u64() {
                Some(toml::Value::String(number.to_string()))
            } else {
                number.as_f64().map(toml::Value::Float)
            }
        },
        Value::String(text) => Some(toml::Value::String(text.clone())),
        Value::Array(items) => Some(toml::Value::Array(
            items.iter().filter_map(json_to_toml).collect(),
        )),
        Value::Object(map) => Some(toml::Value::Table(
            map.iter()
                .filter_map(|(key, nested)| json_to_toml(nested).map(|nested| (key.clone(), nested)))
                .collect(),
        )),
    }
}

/// Typed partial update; omitted fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ConfigPatch {
    /// Changes under `GENERAL`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general: Option<GeneralPatch>,
    /// Changes under `MODELS`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelsPatch>,
    /// Changes under `API_ENDPOINTS`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoints: Option<ApiEndpointsPatch>,
}

/// Partial `GENERAL` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct GeneralPatch {
    /// New `SIMILARITY_MEASURE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_measure: Option<String>,
    /// New `KEEP_ALIVE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

/// Partial `MODELS` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ModelsPatch {
    /// `OPENAI` changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<ApiKeyPatch>,
    /// `GROQ` changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groq: Option<ApiKeyPatch>,
    /// `ANTHROPIC` changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<ApiKeyPatch>,
    /// `GEMINI` changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini: Option<ApiKeyPatch>,
    /// `OLLAMA` changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama: Option<ApiUrlPatch>,
    /// `CUSTOM_OPENAI` changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_openai: Option<CustomOpenAiPatch>,
}

/// Partial key-only provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ApiKeyPatch {
    /// New `API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Partial URL-only provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ApiUrlPatch {
    /// New `API_URL`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// Partial custom OpenAI-compatible provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct CustomOpenAiPatch {
    /// New `API_URL`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// New `API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// New `MODEL_NAME`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl ConfigPatch {
    /// Patch that sets a single leaf.
    #[must_use]
    pub fn single(field: ConfigField, value: impl Into<String>) -> Self {
        let mut patch = Self::default();
        patch.set(field, value);
        patch
    }

    /// Set one leaf in the patch, creating intermediate sections.
    pub fn set(&mut self, field: ConfigField, value: impl Into<String>) {
        let value = Some(value.into());
        match field {
            ConfigField::SimilarityMeasure => {
                self.general.get_or_insert_default().similarity_measure = value;
            },
            ConfigField::KeepAlive => self.general.get_or_insert_default().keep_alive = value,
            ConfigField::OpenaiApiKey => {
                self.models_mut().openai.get_or_insert_default().api_key = value;
            },
            ConfigField::GroqApiKey => {
                self.models_mut().groq.get_or_insert_default().api_key = value;
            },
            ConfigField::AnthropicApiKey => {
                self.models_mut().anthropic.get_or_insert_default().api_key = value;
            },
            ConfigField::GeminiApiKey => {
                self.models_mut().gemini.get_or_insert_default().api_key = value;
            },
            ConfigField::OllamaApiUrl => {
                self.models_mut().ollama.get_or_insert_default().api_url = value;
            },
            ConfigField::CustomOpenaiApiUrl => {
                self.models_mut().custom_openai.get_or_insert_default().api_url = value;
            },
            ConfigField::CustomOpenaiApiKey => {
                self.models_mut().custom_openai.get_or_insert_default().api_key = value;
            },
            ConfigField::CustomOpenaiModelName => {
                self.models_mut().custom_openai.get_or_insert_default().model_name = value;
            },
            ConfigField::SearxngApiEndpoint => {
                self.api_endpoints.get_or_insert_default().searxng = value;
            },
        }
    }

    fn models_mut(&mut self) -> &mut ModelsPatch {
        self.models.get_or_insert_default()
    }

    /// Returns true when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.general.is_none() && self.models.is_none() && self.api_endpoints.is_none()
    }

    /// Untyped JSON form consumed by [`deep_merge`].
    pub fn to_json(&self) -> Result<Value, ErrorEnvelope> {
        serde_json::to_value(self).map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::new("config", "serialize_patch"),
                format!("failed to serialize settings patch: {error}"),
                ErrorClass::NonRetriable,
            )
        })
    }
}

/// Partial `API_ENDPOINTS` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ApiEndpointsPatch {
    /// New `SEARXNG` endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searxng: Option<String>,
}
