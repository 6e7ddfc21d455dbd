//! Output formatter trait

use council_application::CouncilOutcome;

/// Trait for formatting council outcomes
pub trait OutputFormatter {
    /// Format the complete council outcome
    fn format(&self, outcome: &CouncilOutcome) -> String;

    /// Format as JSON
    fn format_json(&self, outcome: &CouncilOutcome) -> String;

    /// Format synthesis only (concise output)
    fn format_synthesis_only(&self, outcome: &CouncilOutcome) -> String;
}
