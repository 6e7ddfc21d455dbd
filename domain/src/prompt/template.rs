//! Prompt templates for the council flow

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for the collection stage.
    ///
    /// `base_prompt` sets the assistant identity shared across the panel and
    /// `personal_prompt` appends the caller's style preferences; either may
    /// be empty.
    pub fn answer_system(base_prompt: &str, personal_prompt: &str) -> String {
        let mut system = if base_prompt.trim().is_empty() {
            Self::default_answer_system().to_string()
        } else {
            base_prompt.trim().to_string()
        };

        if !personal_prompt.trim().is_empty() {
            system.push_str("\n\n");
            system.push_str(personal_prompt.trim());
        }

        system
    }

    fn default_answer_system() -> &'static str {
        r#"You are a knowledgeable expert on a council of independent advisors.
Your task is to provide a thoughtful, well-reasoned answer to the question.
Be concise but comprehensive. Support your points with reasoning and examples where appropriate.
Focus on accuracy and clarity."#
    }

    /// System prompt for the ranking stage
    pub fn ranking_system() -> &'static str {
        r#"You are a critical evaluator comparing anonymized answers to the same question.
You do not know which model wrote which answer, and one of them may be your own.
Judge each answer only on accuracy, completeness, clarity, and practical usefulness.
Be fair but decisive: you must produce a strict ordering with no ties."#
    }

    /// User prompt for the ranking stage.
    ///
    /// `answers` pairs each anonymization label with the answer content.
    /// The closing instruction pins the machine-readable ranking line the
    /// verdict parser looks for.
    pub fn ranking_prompt(question: &str, answers: &[(String, String)]) -> String {
        let mut prompt = format!(
            r#"Original question: {}

Evaluate the following anonymized answers:
"#,
            question
        );

        for (label, content) in answers {
            prompt.push_str(&format!("\n--- Response {} ---\n{}\n", label, content));
        }

        let labels: Vec<&str> = answers.iter().map(|(label, _)| label.as_str()).collect();
        prompt.push_str(&format!(
            r#"
For each answer, give a brief critique (2-3 sentences) covering accuracy, completeness, and clarity.

Then, on the final line of your response, output your ranking from best to worst in exactly this format:

FINAL RANKING: {}

Use only the labels above, separated by " > ", best first. Every answer must appear exactly once."#,
            labels.join(" > ")
        ));

        prompt
    }

    /// System prompt for the synthesis stage
    pub fn synthesis_system() -> &'static str {
        r#"You are the chairman of a council of AI models.
Several models have answered the same question and then ranked each other's answers.
Your task is to synthesize their work into one final answer:
1. Take the strongest elements from the highly ranked answers
2. Resolve disagreements in favor of the better supported position
3. Correct any errors the peer review surfaced

Respond with the final answer only. Do not describe the council process."#
    }

    /// User prompt for the synthesis stage.
    ///
    /// `answers` pairs each model identifier with its answer (identities are
    /// revealed to the chairman); `critiques` pairs each judge with its
    /// free-form evaluation; `leaderboard` lists "model (score N)" lines
    /// best first.
    pub fn synthesis_prompt(
        question: &str,
        answers: &[(String, String)],
        critiques: &[(String, String)],
        leaderboard: &[String],
    ) -> String {
        let mut prompt = format!(
            r#"Original question: {}

Council answers:
"#,
            question
        );

        for (model, content) in answers {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", model, content));
        }

        if !leaderboard.is_empty() {
            prompt.push_str("\nPeer ranking (best first):\n");
            for line in leaderboard {
                prompt.push_str(&format!("{}\n", line));
            }
        }

        if !critiques.is_empty() {
            prompt.push_str("\nPeer critiques:\n");
            for (judge, critique) in critiques {
                prompt.push_str(&format!("\n--- Critique by {} ---\n{}\n", judge, critique));
            }
        }

        prompt.push_str(
            r#"
Based on the answers, ranking, and critiques above, write the single best final answer to the original question."#,
        );

        prompt
    }

    /// System prompt for conversation title generation
    pub fn title_system() -> &'static str {
        r#"You generate short conversation titles.
Respond with a title of at most 6 words summarizing the user's question.
No quotes, no punctuation at the end, no explanations."#
    }

    /// User prompt for conversation title generation
    pub fn title_prompt(question: &str) -> String {
        format!("Generate a title for a conversation that starts with:\n\n{}", question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_system_appends_personalization() {
        let system = PromptTemplate::answer_system("", "Be concise.");
        assert!(system.contains("council of independent advisors"));
        assert!(system.ends_with("Be concise."));
    }

    #[test]
    fn test_answer_system_custom_base_replaces_default() {
        let system = PromptTemplate::answer_system("You are a test assistant.", "");
        assert_eq!(system, "You are a test assistant.");
    }

    #[test]
    fn test_ranking_prompt_contains_labels_not_models() {
        let question = "What is Rust?";
        let answers = vec![
            ("A".to_string(), "Rust is a systems language.".to_string()),
            ("B".to_string(), "Rust focuses on safety.".to_string()),
        ];
        let prompt = PromptTemplate::ranking_prompt(question, &answers);
        assert!(prompt.contains("Response A"));
        assert!(prompt.contains("Response B"));
        assert!(prompt.contains("FINAL RANKING: A > B"));
        assert!(!prompt.contains("openai"));
    }

    #[test]
    fn test_synthesis_prompt_reveals_identities() {
        let answers = vec![("openai/gpt-5.2".to_string(), "An answer.".to_string())];
        let critiques = vec![("x-ai/grok-4".to_string(), "Solid but terse.".to_string())];
        let leaderboard = vec!["openai/gpt-5.2 (score 4)".to_string()];
        let prompt =
            PromptTemplate::synthesis_prompt("What is Rust?", &answers, &critiques, &leaderboard);
        assert!(prompt.contains("openai/gpt-5.2"));
        assert!(prompt.contains("Critique by x-ai/grok-4"));
        assert!(prompt.contains("score 4"));
    }

    #[test]
    fn test_title_prompt_contains_question() {
        let prompt = PromptTemplate::title_prompt("How do lifetimes work?");
        assert!(prompt.contains("How do lifetimes work?"));
    }
}
