//! User settings port
//!
//! Per-caller prompt customization loaded at the start of a run.

use async_trait::async_trait;

/// Prompt customization for one caller
#[derive(Debug, Clone, Default)]
pub struct UserSettings {
    /// Base identity prompt shared by the whole panel; empty selects the
    /// built-in default
    pub base_prompt: String,
    /// Style preferences appended to the collection system prompt
    pub personal_prompt: String,
}

/// Source of per-caller settings.
///
/// Loading is best-effort: implementations fall back to defaults rather
/// than failing the run.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn load_settings(&self, owner: &str) -> UserSettings;
}

/// Fixed settings, independent of the owner
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    settings: UserSettings,
}

impl StaticSettings {
    pub fn new(settings: UserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn load_settings(&self, _owner: &str) -> UserSettings {
        self.settings.clone()
    }
}
