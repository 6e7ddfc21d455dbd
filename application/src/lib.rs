//! Application layer for llm-council
//!
//! This crate contains use cases and port definitions.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    enricher::{LinkMeta, NoEnrichment, TextEnricher},
    llm_gateway::{Completion, GatewayError, LlmGateway},
    progress::{CouncilProgress, NoProgress},
    settings::{SettingsProvider, StaticSettings, UserSettings},
    store::{Conversation, ConversationMeta, ConversationStore, StoreError, StoredMessage},
};
pub use use_cases::run_council::{
    CouncilMetadata, CouncilOutcome, CouncilTiming, RunCouncilError, RunCouncilInput,
    RunCouncilUseCase,
};
pub use use_cases::stream_council::{PersistTarget, StreamCouncilUseCase};
