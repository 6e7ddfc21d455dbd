//! Prompt domain
//!
//! Templates for generating prompts at each stage of a council run.

mod template;

pub use template::PromptTemplate;
