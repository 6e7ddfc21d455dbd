//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for council results
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Full formatted output with all stages
    Full,
    /// Only the final synthesis
    Synthesis,
    /// JSON output
    Json,
}

/// CLI arguments for llm-council
#[derive(Parser, Debug)]
#[command(name = "llm-council")]
#[command(author, version, about = "LLM Council - a panel of models answers, ranks, and synthesizes")]
#[command(long_about = r#"
llm-council puts your question before a council of LLMs.

The process has three stages:
1. Collect: all panel models answer your question in parallel
2. Rank: each model ranks the anonymized answers of its peers
3. Synthesize: a chairman model combines everything into a final answer

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./council.toml      Project-level config
3. ~/.config/llm-council/config.toml   Global config

Example:
  llm-council "What's the best way to handle errors in Rust?"
  llm-council -m openai/gpt-5.2 -m anthropic/claude-opus-4.5 "Compare async runtimes"
  llm-council --stream "Summarize https://example.com/post"
"#)]
pub struct Cli {
    /// The question to ask the council
    pub question: String,

    /// Models to include in the council (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Model to use as chairman for final synthesis
    #[arg(long, value_name = "MODEL")]
    pub chairman: Option<String>,

    /// Emit progress as JSON-line events instead of formatted output
    #[arg(long)]
    pub stream: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "synthesis")]
    pub output: OutputFormat,

    /// Owner id scoping settings and stored conversations
    #[arg(long, default_value = "default")]
    pub owner: String,

    /// Persist the run into this conversation id
    #[arg(long, value_name = "ID")]
    pub conversation: Option<String>,

    /// Skip the concurrent title generation task
    #[arg(long)]
    pub no_title: bool,

    /// Skip link-preview enrichment of the question
    #[arg(long)]
    pub no_enrich: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,
}
