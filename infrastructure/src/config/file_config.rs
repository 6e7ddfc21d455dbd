//! On-disk configuration schema.

use council_application::CouncilTiming;
use council_domain::Model;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root of the TOML configuration file.
///
/// Every section has sensible defaults, so an empty file (or no file at
/// all) yields a working configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub council: CouncilSection,
    #[serde(default)]
    pub timeouts: TimeoutsSection,
    #[serde(default)]
    pub providers: ProvidersSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub prompts: PromptsSection,
}

impl FileConfig {
    pub fn panel(&self) -> Vec<Model> {
        self.council.models.iter().map(Model::new).collect()
    }

    pub fn chairman(&self) -> Model {
        Model::new(&self.council.chairman)
    }

    pub fn timing(&self) -> CouncilTiming {
        CouncilTiming {
            stage: Duration::from_secs(self.timeouts.stage_secs),
            chairman: Duration::from_secs(self.timeouts.chairman_secs),
            title: Duration::from_secs(self.timeouts.title_secs),
        }
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.timeouts.heartbeat_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilSection {
    /// Panel members, as `provider/model` identifiers
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default = "default_chairman")]
    pub chairman: String,
    /// When true, judges rank only the other members' answers
    #[serde(default)]
    pub exclude_own_answer: bool,
}

impl Default for CouncilSection {
    fn default() -> Self {
        Self {
            models: default_models(),
            chairman: default_chairman(),
            exclude_own_answer: false,
        }
    }
}

fn default_models() -> Vec<String> {
    [
        "openai/gpt-5.2",
        "google/gemini-3-pro-preview",
        "anthropic/claude-opus-4.5",
        "qwen/qwen3-max",
        "x-ai/grok-4",
        "moonshotai/kimi-k2-thinking",
        "deepseek/deepseek-v3.2-speciale",
        "mistralai/mistral-large-2512",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_chairman() -> String {
    "google/gemini-3-pro-preview".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsSection {
    #[serde(default = "default_stage_secs")]
    pub stage_secs: u64,
    #[serde(default = "default_chairman_secs")]
    pub chairman_secs: u64,
    #[serde(default = "default_title_secs")]
    pub title_secs: u64,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

impl Default for TimeoutsSection {
    fn default() -> Self {
        Self {
            stage_secs: default_stage_secs(),
            chairman_secs: default_chairman_secs(),
            title_secs: default_title_secs(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

fn default_stage_secs() -> u64 {
    180
}

fn default_chairman_secs() -> u64 {
    300
}

fn default_title_secs() -> u64 {
    60
}

fn default_heartbeat_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersSection {
    /// Provider serving models with an unknown or missing prefix
    #[serde(default = "default_provider")]
    pub default: String,
    /// Issue GigaChat requests one at a time
    #[serde(default)]
    pub gigachat_serialize_requests: bool,
}

impl Default for ProvidersSection {
    fn default() -> Self {
        Self {
            default: default_provider(),
            gigachat_serialize_requests: false,
        }
    }
}

fn default_provider() -> String {
    "openrouter".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data/conversations".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsSection {
    /// Replaces the built-in answering identity when non-empty
    #[serde(default)]
    pub base_prompt: String,
    /// Appended to the answering system prompt when non-empty
    #[serde(default)]
    pub personal_prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FileConfig::default();
        assert_eq!(config.council.models.len(), 8);
        assert_eq!(config.council.chairman, "google/gemini-3-pro-preview");
        assert!(!config.council.exclude_own_answer);
        assert_eq!(config.timeouts.stage_secs, 180);
        assert_eq!(config.timeouts.chairman_secs, 300);
        assert_eq!(config.timeouts.heartbeat_secs, 15);
        assert_eq!(config.providers.default, "openrouter");
        assert_eq!(config.storage.data_dir, "data/conversations");
        assert!(config.prompts.base_prompt.is_empty());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
            [council]
            models = ["openai/gpt-5.2"]

            [timeouts]
            stage_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.council.models, vec!["openai/gpt-5.2"]);
        assert_eq!(config.council.chairman, "google/gemini-3-pro-preview");
        assert_eq!(config.timeouts.stage_secs, 30);
        assert_eq!(config.timeouts.chairman_secs, 300);
    }

    #[test]
    fn test_timing_conversion() {
        let config = FileConfig::default();
        let timing = config.timing();
        assert_eq!(timing.stage, Duration::from_secs(180));
        assert_eq!(timing.chairman, Duration::from_secs(300));
        assert_eq!(timing.title, Duration::from_secs(60));
        assert_eq!(config.heartbeat(), Duration::from_secs(15));
    }

    #[test]
    fn test_panel_and_chairman_as_models() {
        let config = FileConfig::default();
        assert_eq!(config.panel().len(), 8);
        assert_eq!(config.panel()[0].as_str(), "openai/gpt-5.2");
        assert_eq!(config.chairman().as_str(), "google/gemini-3-pro-preview");
    }
}
