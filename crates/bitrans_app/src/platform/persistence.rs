use std::fs;
use std::path::Path;

use bitrans_core::{LlmConfig, PromptRecord, PromptSet, TranslateConfig};
use bitrans_engine::write_atomic;
use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILENAME: &str = "bitrans_settings.ron";

/// Settings shared by every project opened from this directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub translate: TranslateConfig,
    pub llm: LlmConfig,
    pub prompts: PromptSet,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
struct PersistedSettings {
    translate: TranslateConfig,
    llm: LlmConfig,
    prompts: Vec<PromptRecord>,
}

impl From<&Settings> for PersistedSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            translate: settings.translate.clone(),
            llm: settings.llm.clone(),
            prompts: settings.prompts.to_records(),
        }
    }
}

impl From<PersistedSettings> for Settings {
    fn from(persisted: PersistedSettings) -> Self {
        Self {
            translate: persisted.translate,
            llm: persisted.llm,
            prompts: PromptSet::from_records(&persisted.prompts),
        }
    }
}

/// Loads settings, falling back to defaults when the file is missing or unreadable.
pub(crate) fn load_settings(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Settings::default();
        }
        Err(err) => {
            engine_warn!("Failed to read settings from {:?}: {}", path, err);
            return Settings::default();
        }
    };

    match ron::from_str::<PersistedSettings>(&content) {
        Ok(persisted) => {
            engine_info!("Loaded settings from {:?}", path);
            persisted.into()
        }
        Err(err) => {
            engine_warn!("Failed to parse settings from {:?}: {}", path, err);
            Settings::default()
        }
    }
}

pub(crate) fn save_settings(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(&PersistedSettings::from(settings), pretty)?;
    write_atomic(path, content.as_bytes())?;
    engine_info!("Wrote settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitrans_core::PromptKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = load_settings(&temp.path().join(SETTINGS_FILENAME));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILENAME);
        let mut settings = Settings::default();
        settings.llm.api_key = "sk-local".to_string();
        settings.translate.task_retry_threshold = 2;
        settings.prompts.get_mut(PromptKind::GlossaryExtraction).user = "{{text}}".to_string();

        save_settings(&path, &settings).unwrap();

        assert_eq!(load_settings(&path), settings);
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILENAME);
        fs::write(&path, "(translate: 12").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }
}
