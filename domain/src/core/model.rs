//! Model value object representing an LLM backend

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A panel model identifier (Value Object)
///
/// Identifiers are namespaced by provider: `provider/name` routes to the
/// provider matching the prefix, while a bare name (or an unknown prefix)
/// falls through to the primary provider. The identifier is otherwise
/// opaque to the domain; no catalog of known models is maintained here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Model(String);

impl Model {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the full string identifier for this model
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The provider namespace: the prefix before the first `/`, if any
    pub fn provider(&self) -> Option<&str> {
        self.0.split_once('/').map(|(prefix, _)| prefix)
    }

    /// The bare model name, with any provider prefixes stripped
    pub fn short_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Get the default panel for a council request
    pub fn default_panel() -> Vec<Model> {
        [
            "openai/gpt-5.2",
            "google/gemini-3-pro-preview",
            "anthropic/claude-opus-4.5",
            "x-ai/grok-4",
        ]
        .into_iter()
        .map(Model::new)
        .collect()
    }

    /// The default chairman used for the synthesis stage
    pub fn default_chairman() -> Model {
        Model::new("google/gemini-3-pro-preview")
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Model::new(s))
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        Model::new(s)
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Model::new(s))
    }
}
