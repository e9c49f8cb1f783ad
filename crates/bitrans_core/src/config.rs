use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Translation settings. Read-only to a running job: each job snapshots the
/// configuration when it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslateConfig {
    /// Maximum source characters submitted in one request.
    pub max_text_length: usize,
    pub original_language: String,
    pub translated_language: String,
    /// Per-request timeout in seconds.
    pub timeout_threshold: u64,
    /// Retries after the first attempt of a batch.
    pub task_retry_threshold: u32,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            max_text_length: 500,
            original_language: "ja".to_string(),
            translated_language: "zh-CN".to_string(),
            timeout_threshold: 120,
            task_retry_threshold: 16,
        }
    }
}

/// Connection settings for the chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Full endpoint URL, e.g. `http://localhost:1234/v1/chat/completions`.
    pub api: String,
    pub api_provider_name: String,
    pub model: String,
    pub api_key: String,
    /// Extra request fields, stored as text and coerced on the wire.
    pub parameter: BTreeMap<String, String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let parameter = [("temperature", "0"), ("max_tokens", "2000")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            api: String::new(),
            api_provider_name: "OpenAI".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: String::new(),
            parameter,
        }
    }
}

impl LlmConfig {
    /// Fills fields left empty from `fallback`. Archives written by older
    /// versions carry no endpoint, for example.
    pub fn fill_missing_from(&mut self, fallback: &LlmConfig) {
        for (field, backup) in [
            (&mut self.api, &fallback.api),
            (&mut self.api_provider_name, &fallback.api_provider_name),
            (&mut self.model, &fallback.model),
            (&mut self.api_key, &fallback.api_key),
        ] {
            if field.trim().is_empty() {
                field.clone_from(backup);
            }
        }
        if self.parameter.is_empty() {
            self.parameter.clone_from(&fallback.parameter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_config_reads_camel_case_with_defaults() {
        let json = r#"{"maxTextLength": 800, "taskRetryThreshold": 2, "autosaveInterval": 60}"#;
        let config: TranslateConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_text_length, 800);
        assert_eq!(config.task_retry_threshold, 2);
        assert_eq!(config.original_language, "ja");
        assert_eq!(config.timeout_threshold, 120);
    }

    #[test]
    fn archive_llm_config_without_endpoint_keeps_settings_endpoint() {
        let json = r#"{"api_provider_name":"OpenAI","model":"m","api_key":"k","parameter":{}}"#;
        let mut config: LlmConfig = serde_json::from_str(json).unwrap();
        let settings = LlmConfig {
            api: "http://localhost:1234/v1/chat/completions".to_string(),
            api_key: "settings-key".to_string(),
            ..LlmConfig::default()
        };
        config.fill_missing_from(&settings);

        assert_eq!(config.api, "http://localhost:1234/v1/chat/completions");
        assert_eq!(config.model, "m");
        assert_eq!(config.api_key, "k");
        assert_eq!(config.parameter, settings.parameter);
    }
}
