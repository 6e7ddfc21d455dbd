//! Presentation layer for llm-council
//!
//! This crate contains CLI definitions, output formatters,
//! progress reporters, and the streaming event printer.

pub mod cli;
pub mod output;
pub mod progress;
pub mod stream;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
pub use stream::printer::print_event_stream;
