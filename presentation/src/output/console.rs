//! Console output formatter for council outcomes

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_application::CouncilOutcome;

/// Formats council outcomes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete council outcome
    pub fn format(outcome: &CouncilOutcome) -> String {
        let mut output = String::new();

        // Header
        output.push_str(&Self::header("LLM Council Results"));
        output.push('\n');

        // Question
        output.push_str(&format!(
            "{} {}\n\n",
            "Question:".cyan().bold(),
            outcome.turn.question
        ));

        if let Some(title) = &outcome.metadata.title {
            output.push_str(&format!("{} {}\n\n", "Title:".cyan().bold(), title));
        }

        // Stage 1: Collected Answers
        output.push_str(&Self::section_header("Stage 1: Collected Answers"));
        for response in &outcome.turn.stage1 {
            if response.succeeded {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!("-- {} --", response.model).yellow().bold(),
                    response.content
                ));
            } else {
                output.push_str(&format!(
                    "\n{}\nError: {}\n",
                    format!("-- {} --", response.model).red().bold(),
                    response.error.as_deref().unwrap_or("Unknown")
                ));
            }
        }

        // Stage 2: Peer Rankings
        output.push_str(&Self::section_header("Stage 2: Peer Rankings"));
        if !outcome.metadata.aggregate_ranking.is_empty() {
            output.push_str(&format!("\n{}\n", "Leaderboard:".cyan().bold()));
            for row in &outcome.metadata.aggregate_ranking {
                output.push_str(&format!(
                    "  {}. {} ({} points)\n",
                    row.rank, row.model, row.score
                ));
            }
        }
        for verdict in outcome.turn.verdicts.iter().filter(|v| v.succeeded) {
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("-- Judge {} --", verdict.judge).yellow().bold(),
                verdict.critique
            ));
        }

        // Stage 3: Synthesis
        output.push_str(&Self::section_header("Stage 3: Final Synthesis"));
        let chairman_line = format!("Chairman: {}", outcome.turn.synthesis.model);
        if outcome.turn.synthesis.succeeded {
            output.push_str(&format!(
                "\n{}\n\n{}\n",
                chairman_line.yellow().bold(),
                outcome.turn.synthesis.content
            ));
        } else {
            output.push_str(&format!(
                "\n{}\n\nError: {}\n",
                chairman_line.red().bold(),
                outcome.turn.synthesis.content
            ));
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(outcome: &CouncilOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format synthesis only (concise output)
    pub fn format_synthesis_only(outcome: &CouncilOutcome) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== LLM Council Answer ===".cyan().bold()
        ));

        output.push_str(&format!("{} {}\n\n", "Q:".bold(), outcome.turn.question));

        let models: Vec<String> = outcome
            .turn
            .stage1
            .iter()
            .map(|r| r.model.to_string())
            .collect();
        output.push_str(&format!(
            "{} {}\n\n",
            "Models consulted:".dimmed(),
            models.join(", ")
        ));

        output.push_str(&outcome.turn.synthesis.content);
        output.push('\n');

        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, outcome: &CouncilOutcome) -> String {
        Self::format(outcome)
    }

    fn format_json(&self, outcome: &CouncilOutcome) -> String {
        Self::format_json(outcome)
    }

    fn format_synthesis_only(&self, outcome: &CouncilOutcome) -> String {
        Self::format_synthesis_only(outcome)
    }
}
