//! Environment overrides for the settings record.
//!
//! Precedence is per leaf: a non-empty variable wins over the persisted
//! value; an unset or empty variable leaves the persisted value in place.
//! Values are taken verbatim (no trimming).

use crate::schema::{Config, ConfigField};
use search_settings_ports::EnvSourcePort;
use search_settings_shared::{REDACTED_VALUE, SecretString, is_secret_key};
use std::collections::BTreeMap;

/// Env var: similarity measure.
pub const ENV_SIMILARITY_MEASURE: &str = "SIMILARITY_MEASURE";
/// Env var: keep-alive duration.
pub const ENV_KEEP_ALIVE: &str = "KEEP_ALIVE";
/// Env var: OpenAI API key (secret).
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Env var: Groq API key (secret).
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
/// Env var: Anthropic API key (secret).
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
/// Env var: Gemini API key (secret).
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// Env var: Ollama base URL.
pub const ENV_OLLAMA_API_URL: &str = "OLLAMA_API_URL";
/// Env var: custom OpenAI-compatible base URL.
pub const ENV_CUSTOM_OPENAI_API_URL: &str = "CUSTOM_OPENAI_API_URL";
/// Env var: custom OpenAI-compatible API key (secret).
pub const ENV_CUSTOM_OPENAI_API_KEY: &str = "CUSTOM_OPENAI_API_KEY";
/// Env var: custom OpenAI-compatible model name.
pub const ENV_CUSTOM_OPENAI_MODEL_NAME: &str = "CUSTOM_OPENAI_MODEL_NAME";
/// Env var: `SearxNG` endpoint.
pub const ENV_SEARXNG_API_URL: &str = "SEARXNG_API_URL";

/// Typed env-derived overrides for [`Config`].
///
/// `None` means "unset or empty"; the persisted value applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsEnv {
    /// Override for `GENERAL.SIMILARITY_MEASURE`.
    pub similarity_measure: Option<Box<str>>,
    /// Override for `GENERAL.KEEP_ALIVE`.
    pub keep_alive: Option<Box<str>>,
    /// Override for `MODELS.OPENAI.API_KEY`.
    pub openai_api_key: Option<SecretString>,
    /// Override for `MODELS.GROQ.API_KEY`.
    pub groq_api_key: Option<SecretString>,
    /// Override for `MODELS.ANTHROPIC.API_KEY`.
    pub anthropic_api_key: Option<SecretString>,
    /// Override for `MODELS.GEMINI.API_KEY`.
    pub gemini_api_key: Option<SecretString>,
    /// Override for `MODELS.OLLAMA.API_URL`.
    pub ollama_api_url: Option<Box<str>>,
    /// Override for `MODELS.CUSTOM_OPENAI.API_URL`.
    pub custom_openai_api_url: Option<Box<str>>,
    /// Override for `MODELS.CUSTOM_OPENAI.API_KEY`.
    pub custom_openai_api_key: Option<SecretString>,
    /// Override for `MODELS.CUSTOM_OPENAI.MODEL_NAME`.
    pub custom_openai_model_name: Option<Box<str>>,
    /// Override for `API_ENDPOINTS.SEARXNG`.
    pub searxng_api_url: Option<Box<str>>,
}

impl SettingsEnv {
    /// Parse overrides from a key/value map (useful for tests and fixtures).
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self::from_lookup(|name| map.get(name).cloned())
    }

    /// Read overrides from an env source port.
    #[must_use]
    pub fn from_source(source: &dyn EnvSourcePort) -> Self {
        Self::from_lookup(|name| source.var(name))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |var: &str| non_empty(lookup(var)).map(String::into_boxed_str);
        let secret = |var: &str| non_empty(lookup(var)).map(SecretString::from);

        Self {
            similarity_measure: text(ENV_SIMILARITY_MEASURE),
            keep_alive: text(ENV_KEEP_ALIVE),
            openai_api_key: secret(ENV_OPENAI_API_KEY),
            groq_api_key: secret(ENV_GROQ_API_KEY),
            anthropic_api_key: secret(ENV_ANTHROPIC_API_KEY),
            gemini_api_key: secret(ENV_GEMINI_API_KEY),
            ollama_api_url: text(ENV_OLLAMA_API_URL),
            custom_openai_api_url: text(ENV_CUSTOM_OPENAI_API_URL),
            custom_openai_api_key: secret(ENV_CUSTOM_OPENAI_API_KEY),
            custom_openai_model_name: text(ENV_CUSTOM_OPENAI_MODEL_NAME),
            searxng_api_url: text(ENV_SEARXNG_API_URL),
        }
    }

    /// Override value for a leaf, if one is set.
    #[must_use]
    pub fn value_for(&self, field: ConfigField) -> Option<&str> {
        match field {
            ConfigField::SimilarityMeasure => self.similarity_measure.as_deref(),
            ConfigField::KeepAlive => self.keep_alive.as_deref(),
            ConfigField::OpenaiApiKey => self.openai_api_key.as_ref().map(SecretString::expose),
            ConfigField::GroqApiKey => self.groq_api_key.as_ref().map(SecretString::expose),
            ConfigField::AnthropicApiKey => {
                self.anthropic_api_key.as_ref().map(SecretString::expose)
            },
            ConfigField::GeminiApiKey => self.gemini_api_key.as_ref().map(SecretString::expose),
            ConfigField::OllamaApiUrl => self.ollama_api_url.as_deref(),
            ConfigField::CustomOpenaiApiUrl => self.custom_openai_api_url.as_deref(),
            ConfigField::CustomOpenaiApiKey => self
                .custom_openai_api_key
                .as_ref()
                .map(SecretString::expose),
            ConfigField::CustomOpenaiModelName => self.custom_openai_model_name.as_deref(),
            ConfigField::SearxngApiEndpoint => self.searxng_api_url.as_deref(),
        }
    }

    /// Names of the variables currently overriding a leaf.
    #[must_use]
    pub fn active_vars(&self) -> Vec<&'static str> {
        ConfigField::ALL
            .into_iter()
            .filter(|field| self.value_for(*field).is_some())
            .map(ConfigField::env_var)
            .collect()
    }

    /// Map of active overrides with secret values redacted, for diagnostics.
    #[must_use]
    pub fn redacted_map(&self) -> BTreeMap<&'static str, String> {
        ConfigField::ALL
            .into_iter()
            .filter_map(|field| {
                self.value_for(field)
                    .map(|value| (field.env_var(), redact_value(field.env_var(), value)))
            })
            .collect()
    }
}

/// Apply env overrides to a base config (env wins over file values).
#[must_use]
pub fn apply_env_overrides(base: Config, env: &SettingsEnv) -> Config {
    let mut config = base;
    for field in ConfigField::ALL {
        if let Some(value) = env.value_for(field) {
            *field.get_mut(&mut config) = value.to_owned();
        }
    }
    config
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_key(var) {
        REDACTED_VALUE.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn env_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn empty_values_count_as_unset() {
        let env = SettingsEnv::from_map(&env_map(&[
            (ENV_OPENAI_API_KEY, ""),
            (ENV_KEEP_ALIVE, "10m"),
        ]));
        assert_eq!(env.openai_api_key, None);
        assert_eq!(env.keep_alive.as_deref(), Some("10m"));
        assert_eq!(env.active_vars(), vec![ENV_KEEP_ALIVE]);
    }

    #[test]
    fn values_are_not_trimmed() {
        let env = SettingsEnv::from_map(&env_map(&[(ENV_SEARXNG_API_URL, "  ")]));
        assert_eq!(env.value_for(ConfigField::SearxngApiEndpoint), Some("  "));
    }

    #[test]
    fn env_key_wins_over_file_key() {
        let mut base = Config::default();
        base.models.openai.api_key = "FILE_KEY".to_string();
        base.models.groq.api_key = "GROQ_FILE".to_string();
        let env = SettingsEnv::from_map(&env_map(&[(ENV_OPENAI_API_KEY, "ENV_KEY")]));

        let effective = apply_env_overrides(base, &env);
        assert_eq!(effective.models.openai.api_key, "ENV_KEY");
        assert_eq!(effective.models.groq.api_key, "GROQ_FILE");
    }

    #[test]
    fn redacted_map_hides_secrets() {
        let env = SettingsEnv::from_map(&env_map(&[
            (ENV_GEMINI_API_KEY, "AIza-secret"),
            (ENV_SIMILARITY_MEASURE, "dot"),
        ]));
        let map = env.redacted_map();
        assert_eq!(
            map.get(ENV_GEMINI_API_KEY).map(String::as_str),
            Some(REDACTED_VALUE)
        );
        assert_eq!(
            map.get(ENV_SIMILARITY_MEASURE).map(String::as_str),
            Some("dot")
        );
        assert!(!format!("{env:?}").contains("AIza-secret"));
    }

    proptest! {
        #[test]
        fn precedence_is_per_leaf(
            index in 0..ConfigField::ALL.len(),
            file_value in "[a-z0-9]{0,8}",
            env_value in "[a-z0-9]{0,8}",
        ) {
            let field = ConfigField::ALL[index];
            let mut base = Config::default();
            *field.get_mut(&mut base) = file_value.clone();
            let env = SettingsEnv::from_map(&env_map(&[(field.env_var(), env_value.as_str())]));

            let effective = apply_env_overrides(base, &env);
            let expected = if env_value.is_empty() { file_value } else { env_value };
            prop_assert_eq!(field.get(&effective), expected.as_str());
            for other in ConfigField::ALL.into_iter().filter(|other| *other != field) {
                prop_assert_eq!(other.get(&effective), "");
            }
        }
    }
}
