//! Run Council use case
//!
//! Orchestrates the full three-stage council flow: collect answers from the
//! panel, have the panel rank the anonymized answers, and let the chairman
//! synthesize the final response.

use crate::ports::enricher::{LinkMeta, NoEnrichment, TextEnricher};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::{CouncilProgress, NoProgress};
use crate::ports::settings::{SettingsProvider, StaticSettings};
use crate::use_cases::fanout::{FanoutError, fan_out};
use council_domain::{
    CouncilTurn, LabelMap, Message, Model, PromptTemplate, Question, RankedModel, RankingVerdict,
    Stage, StageOneResponse, SynthesisResult, aggregate_rankings, parse_ranked_labels,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that can occur during council execution
#[derive(Error, Debug)]
pub enum RunCouncilError {
    #[error("No models configured")]
    NoModels,

    #[error("Cancelled")]
    Cancelled,
}

impl From<FanoutError> for RunCouncilError {
    fn from(e: FanoutError) -> Self {
        match e {
            FanoutError::NoModels => RunCouncilError::NoModels,
            FanoutError::Cancelled => RunCouncilError::Cancelled,
        }
    }
}

/// Per-call deadlines for each part of a run.
///
/// Stage 1 and Stage 2 calls race against parallel siblings and share the
/// same budget; the single chairman call gets a longer one.
#[derive(Debug, Clone)]
pub struct CouncilTiming {
    /// Per-model deadline for collection and ranking calls
    pub stage: Duration,
    /// Deadline for the chairman synthesis call
    pub chairman: Duration,
    /// Deadline for the title side task
    pub title: Duration,
}

impl Default for CouncilTiming {
    fn default() -> Self {
        Self {
            stage: Duration::from_secs(180),
            chairman: Duration::from_secs(300),
            title: Duration::from_secs(60),
        }
    }
}

/// Input for the RunCouncil use case
#[derive(Debug, Clone)]
pub struct RunCouncilInput {
    /// The question to put before the panel
    pub question: Question,
    /// Panel models; fixed for the lifetime of the request
    pub panel: Vec<Model>,
    /// Chairman override; the default chairman when `None`
    pub chairman: Option<Model>,
    /// Owner id used for settings lookup and persistence scoping
    pub owner: String,
    /// Whether to run the concurrent title side task
    pub generate_title: bool,
}

impl RunCouncilInput {
    pub fn new(question: Question, panel: Vec<Model>) -> Self {
        Self {
            question,
            panel,
            chairman: None,
            owner: String::new(),
            generate_title: false,
        }
    }

    pub fn with_chairman(mut self, chairman: Option<Model>) -> Self {
        self.chairman = chairman;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_title_generation(mut self, enabled: bool) -> Self {
        self.generate_title = enabled;
        self
    }

    /// The chairman that will actually be used
    pub fn effective_chairman(&self) -> Model {
        self.chairman.clone().unwrap_or_else(Model::default_chairman)
    }
}

/// Request-scoped data that is reported but not part of the stored turn
#[derive(Debug, Clone, Serialize)]
pub struct CouncilMetadata {
    /// The revealed anonymization mapping
    pub label_to_model: BTreeMap<String, Model>,
    /// The Borda-count leaderboard, best first
    pub aggregate_ranking: Vec<RankedModel>,
    /// Links fetched during question enrichment
    pub links: Vec<LinkMeta>,
    /// Generated conversation title, when the side task ran and succeeded
    pub title: Option<String>,
}

/// Result of a completed council run
#[derive(Debug, Clone, Serialize)]
pub struct CouncilOutcome {
    pub turn: CouncilTurn,
    pub metadata: CouncilMetadata,
}

/// Use case for running a council request
pub struct RunCouncilUseCase {
    gateway: Arc<dyn LlmGateway>,
    settings: Arc<dyn SettingsProvider>,
    enricher: Arc<dyn TextEnricher>,
    timing: CouncilTiming,
    exclude_own_answer: bool,
}

impl RunCouncilUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            settings: Arc::new(StaticSettings::default()),
            enricher: Arc::new(NoEnrichment),
            timing: CouncilTiming::default(),
            exclude_own_answer: false,
        }
    }

    pub fn with_settings(mut self, settings: Arc<dyn SettingsProvider>) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn TextEnricher>) -> Self {
        self.enricher = enricher;
        self
    }

    pub fn with_timing(mut self, timing: CouncilTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Hide each judge's own answer from its ranking prompt.
    ///
    /// Off by default: judges see every anonymized answer, possibly
    /// including their own, without knowing which.
    pub fn with_exclude_own_answer(mut self, exclude: bool) -> Self {
        self.exclude_own_answer = exclude;
        self
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: RunCouncilInput,
        cancel: &CancellationToken,
    ) -> Result<CouncilOutcome, RunCouncilError> {
        self.execute_with_progress(input, cancel, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunCouncilInput,
        cancel: &CancellationToken,
        progress: &dyn CouncilProgress,
    ) -> Result<CouncilOutcome, RunCouncilError> {
        if input.panel.is_empty() {
            return Err(RunCouncilError::NoModels);
        }

        let chairman = input.effective_chairman();
        info!(
            panel = input.panel.len(),
            chairman = %chairman,
            "Starting council run"
        );

        let title_task = self.spawn_title_task(&input, &chairman);

        let stages = async {
            // Stage 1: Collect
            let (stage1, links) = self.stage_collect(&input, cancel, progress).await?;

            // Stage 2: Rank
            let (verdicts, labels, aggregate) = self
                .stage_rank(&input, &stage1, cancel, progress)
                .await?;

            // Stage 3: Synthesize
            let synthesis = self
                .stage_synthesize(
                    &input, &chairman, &stage1, &verdicts, &aggregate, cancel, progress,
                )
                .await?;

            Ok::<_, RunCouncilError>((stage1, links, verdicts, labels, aggregate, synthesis))
        }
        .await;

        let (stage1, links, verdicts, labels, aggregate, synthesis) = match stages {
            Ok(parts) => parts,
            Err(e) => {
                // An abandoned run has no consumer for the title
                if let Some(handle) = title_task {
                    handle.abort();
                }
                return Err(e);
            }
        };

        let title = match title_task {
            Some(handle) => handle.await.ok().flatten(),
            None => None,
        };
        if let Some(ref title) = title {
            progress.on_title_complete(title);
        }

        let question = input.question.content().to_string();
        Ok(CouncilOutcome {
            turn: CouncilTurn::new(question, stage1, verdicts, synthesis),
            metadata: CouncilMetadata {
                label_to_model: labels.to_map(),
                aggregate_ranking: aggregate,
                links,
                title,
            },
        })
    }

    /// Title generation runs beside the three stages and never blocks them
    fn spawn_title_task(
        &self,
        input: &RunCouncilInput,
        chairman: &Model,
    ) -> Option<JoinHandle<Option<String>>> {
        if !input.generate_title {
            return None;
        }

        let gateway = Arc::clone(&self.gateway);
        let model = chairman.clone();
        let question = input.question.content().to_string();
        let deadline = self.timing.title;

        Some(tokio::spawn(async move {
            let messages = vec![
                Message::system(PromptTemplate::title_system()),
                Message::user(PromptTemplate::title_prompt(&question)),
            ];
            match tokio::time::timeout(deadline, gateway.complete(&model, &messages)).await {
                Ok(Ok(completion)) => {
                    let title = completion.content.trim().to_string();
                    if title.is_empty() { None } else { Some(title) }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Title generation failed");
                    None
                }
                Err(_) => {
                    warn!("Title generation timed out");
                    None
                }
            }
        }))
    }

    /// Stage 1: every panel model answers the (enriched) question
    async fn stage_collect(
        &self,
        input: &RunCouncilInput,
        cancel: &CancellationToken,
        progress: &dyn CouncilProgress,
    ) -> Result<(Vec<StageOneResponse>, Vec<LinkMeta>), RunCouncilError> {
        info!("Stage 1: Collect");
        progress.on_stage_start(Stage::Collect, &input.panel);

        let settings = self.settings.load_settings(&input.owner).await;
        let (enriched, links) = self.enricher.enrich(input.question.content()).await;
        let system =
            PromptTemplate::answer_system(&settings.base_prompt, &settings.personal_prompt);

        let mut results = fan_out(
            &self.gateway,
            &input.panel,
            |_| {
                vec![
                    Message::system(system.clone()),
                    Message::user(enriched.clone()),
                ]
            },
            self.timing.stage,
            cancel,
            |model, success| progress.on_model_complete(Stage::Collect, model, success),
        )
        .await?;

        // Exactly one entry per requested model, in panel order
        let mut stage1 = Vec::with_capacity(input.panel.len());
        for model in &input.panel {
            let entry = match results.remove(model) {
                Some(Ok(completion)) => StageOneResponse::success(
                    model.clone(),
                    completion.content,
                    completion.reasoning,
                ),
                Some(Err(e)) => StageOneResponse::failure(model.clone(), e.to_string()),
                None => StageOneResponse::failure(model.clone(), "call did not resolve"),
            };
            stage1.push(entry);
        }

        progress.on_stage1_complete(&stage1);
        progress.on_stage_complete(Stage::Collect);
        Ok((stage1, links))
    }

    /// Stage 2: every panel model judges the anonymized usable answers
    async fn stage_rank(
        &self,
        input: &RunCouncilInput,
        stage1: &[StageOneResponse],
        cancel: &CancellationToken,
        progress: &dyn CouncilProgress,
    ) -> Result<(Vec<RankingVerdict>, LabelMap, Vec<RankedModel>), RunCouncilError> {
        info!("Stage 2: Rank");

        let usable: Vec<&StageOneResponse> = stage1.iter().filter(|r| r.is_usable()).collect();
        let labels = LabelMap::assign(usable.iter().map(|r| r.model.clone()));

        let verdicts = if usable.is_empty() {
            debug!("Skipping ranking: no usable answers to judge");
            progress.on_stage_start(Stage::Rank, &[]);
            Vec::new()
        } else {
            progress.on_stage_start(Stage::Rank, &input.panel);

            // (label, content, author) per anonymized answer
            let answers: Vec<(String, String, Model)> = usable
                .iter()
                .map(|r| {
                    let label = labels.label_for(&r.model).unwrap_or("").to_string();
                    (label, r.content.clone(), r.model.clone())
                })
                .collect();

            let question = input.question.content();
            let exclude_own = self.exclude_own_answer;
            let mut results = fan_out(
                &self.gateway,
                &input.panel,
                |judge| {
                    let visible: Vec<(String, String)> = answers
                        .iter()
                        .filter(|(_, _, author)| !(exclude_own && author == judge))
                        .map(|(label, content, _)| (label.clone(), content.clone()))
                        .collect();
                    vec![
                        Message::system(PromptTemplate::ranking_system()),
                        Message::user(PromptTemplate::ranking_prompt(question, &visible)),
                    ]
                },
                self.timing.stage,
                cancel,
                |model, success| progress.on_model_complete(Stage::Rank, model, success),
            )
            .await?;

            let mut verdicts = Vec::with_capacity(input.panel.len());
            for judge in &input.panel {
                let verdict = match results.remove(judge) {
                    Some(Ok(completion)) => {
                        let ranking = parse_ranked_labels(&completion.content, &labels);
                        if ranking.is_empty() {
                            warn!(judge = %judge, "Verdict contained no recognizable ranking");
                        }
                        RankingVerdict::success(judge.clone(), ranking, completion.content)
                    }
                    _ => RankingVerdict::failure(judge.clone()),
                };
                verdicts.push(verdict);
            }
            verdicts
        };

        let aggregate = aggregate_rankings(&verdicts, &labels, stage1);
        progress.on_stage2_complete(&verdicts, &labels, &aggregate);
        progress.on_stage_complete(Stage::Rank);
        Ok((verdicts, labels, aggregate))
    }

    /// Stage 3: the chairman synthesizes the final answer
    #[allow(clippy::too_many_arguments)]
    async fn stage_synthesize(
        &self,
        input: &RunCouncilInput,
        chairman: &Model,
        stage1: &[StageOneResponse],
        verdicts: &[RankingVerdict],
        aggregate: &[RankedModel],
        cancel: &CancellationToken,
        progress: &dyn CouncilProgress,
    ) -> Result<SynthesisResult, RunCouncilError> {
        info!("Stage 3: Synthesize");
        progress.on_stage_start(Stage::Synthesize, std::slice::from_ref(chairman));

        // Identities are revealed to the chairman
        let answers: Vec<(String, String)> = stage1
            .iter()
            .filter(|r| r.is_usable())
            .map(|r| (r.model.to_string(), r.content.clone()))
            .collect();
        let critiques: Vec<(String, String)> = verdicts
            .iter()
            .filter(|v| v.succeeded)
            .map(|v| (v.judge.to_string(), v.critique.clone()))
            .collect();
        let leaderboard: Vec<String> = aggregate
            .iter()
            .map(|r| format!("{}. {} (score {})", r.rank, r.model, r.score))
            .collect();

        let messages = vec![
            Message::system(PromptTemplate::synthesis_system()),
            Message::user(PromptTemplate::synthesis_prompt(
                input.question.content(),
                &answers,
                &critiques,
                &leaderboard,
            )),
        ];

        let synthesis = tokio::select! {
            _ = cancel.cancelled() => return Err(RunCouncilError::Cancelled),
            result = tokio::time::timeout(
                self.timing.chairman,
                self.gateway.complete(chairman, &messages),
            ) => match result {
                Ok(Ok(completion)) => {
                    progress.on_model_complete(Stage::Synthesize, chairman, true);
                    SynthesisResult::new(chairman.clone(), completion.content)
                }
                Ok(Err(e)) => {
                    warn!(chairman = %chairman, error = %e, "Synthesis failed");
                    progress.on_model_complete(Stage::Synthesize, chairman, false);
                    SynthesisResult::failure(chairman.clone(), e.to_string())
                }
                Err(_) => {
                    warn!(chairman = %chairman, "Synthesis timed out");
                    progress.on_model_complete(Stage::Synthesize, chairman, false);
                    SynthesisResult::failure(chairman.clone(), GatewayError::Timeout.to_string())
                }
            },
        };

        progress.on_stage3_complete(&synthesis);
        progress.on_stage_complete(Stage::Synthesize);
        Ok(synthesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::Completion;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Gateway that classifies each request by its system prompt and
    /// records every message list it sees.
    struct FakeCouncilGateway {
        answers: HashMap<String, Result<String, String>>,
        rankings: HashMap<String, Result<String, String>>,
        synthesis: Result<String, String>,
        title: Result<String, String>,
        calls: Mutex<Vec<(Model, Vec<Message>)>>,
    }

    impl FakeCouncilGateway {
        fn new() -> Self {
            Self {
                answers: HashMap::new(),
                rankings: HashMap::new(),
                synthesis: Ok("synthesized".into()),
                title: Ok("A Title".into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn answer(mut self, model: &str, result: Result<&str, &str>) -> Self {
            self.answers.insert(
                model.into(),
                result.map(str::to_string).map_err(str::to_string),
            );
            self
        }

        fn ranking(mut self, model: &str, result: Result<&str, &str>) -> Self {
            self.rankings.insert(
                model.into(),
                result.map(str::to_string).map_err(str::to_string),
            );
            self
        }

        fn synthesis(mut self, result: Result<&str, &str>) -> Self {
            self.synthesis = result.map(str::to_string).map_err(str::to_string);
            self
        }

        fn ranking_prompts(&self) -> Vec<(Model, String)> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, messages)| {
                    messages[0].content.contains("critical evaluator")
                })
                .map(|(model, messages)| (model.clone(), messages[1].content.clone()))
                .collect()
        }

        fn synthesis_prompt(&self) -> String {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .find(|(_, messages)| messages[0].content.contains("chairman"))
                .map(|(_, messages)| messages[1].content.clone())
                .unwrap()
        }
    }

    #[async_trait]
    impl LlmGateway for FakeCouncilGateway {
        async fn complete(
            &self,
            model: &Model,
            messages: &[Message],
        ) -> Result<Completion, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.clone(), messages.to_vec()));

            let system = &messages[0].content;
            let scripted = if system.contains("critical evaluator") {
                self.rankings.get(model.as_str()).cloned()
            } else if system.contains("chairman") {
                Some(self.synthesis.clone())
            } else if system.contains("conversation titles") {
                Some(self.title.clone())
            } else {
                self.answers.get(model.as_str()).cloned()
            };

            match scripted {
                Some(Ok(content)) => Ok(Completion::new(content)),
                Some(Err(reason)) => Err(GatewayError::RequestFailed(reason)),
                None => Err(GatewayError::NoProvider(model.to_string())),
            }
        }
    }

    /// Progress recorder capturing callback order as short tags
    #[derive(Default)]
    struct RecordingProgress {
        tags: Mutex<Vec<String>>,
    }

    impl RecordingProgress {
        fn tags(&self) -> Vec<String> {
            self.tags.lock().unwrap().clone()
        }
    }

    impl CouncilProgress for RecordingProgress {
        fn on_stage_start(&self, stage: Stage, models: &[Model]) {
            self.tags
                .lock()
                .unwrap()
                .push(format!("{}_start:{}", stage.as_str(), models.len()));
        }

        fn on_model_complete(&self, stage: Stage, model: &Model, success: bool) {
            self.tags
                .lock()
                .unwrap()
                .push(format!("{}_model:{}:{}", stage.as_str(), model, success));
        }

        fn on_stage_complete(&self, stage: Stage) {
            self.tags
                .lock()
                .unwrap()
                .push(format!("{}_complete", stage.as_str()));
        }

        fn on_title_complete(&self, title: &str) {
            self.tags.lock().unwrap().push(format!("title:{}", title));
        }
    }

    fn panel() -> Vec<Model> {
        vec![Model::new("m1"), Model::new("m2"), Model::new("m3")]
    }

    fn input(question: &str) -> RunCouncilInput {
        RunCouncilInput::new(
            Question::try_new(question).unwrap(),
            panel(),
        )
        .with_chairman(Some(Model::new("chair")))
    }

    fn use_case(gateway: FakeCouncilGateway) -> RunCouncilUseCase {
        RunCouncilUseCase::new(Arc::new(gateway))
    }

    #[tokio::test]
    async fn test_happy_path_produces_full_turn() {
        let gateway = FakeCouncilGateway::new()
            .answer("m1", Ok("answer one"))
            .answer("m2", Ok("answer two"))
            .answer("m3", Ok("answer three"))
            .ranking("m1", Ok("FINAL RANKING: B > A > C"))
            .ranking("m2", Ok("FINAL RANKING: B > A > C"))
            .ranking("m3", Ok("FINAL RANKING: B > C > A"))
            .synthesis(Ok("the final answer"));

        let cancel = CancellationToken::new();
        let outcome = use_case(gateway)
            .execute(input("What is Rust?"), &cancel)
            .await
            .unwrap();

        assert_eq!(outcome.turn.stage1.len(), 3);
        assert_eq!(outcome.turn.verdicts.len(), 3);
        assert!(outcome.turn.synthesis.succeeded);
        assert_eq!(outcome.turn.synthesis.content, "the final answer");

        // m2 was ranked first by every judge
        let top = &outcome.metadata.aggregate_ranking[0];
        assert_eq!(top.model, Model::new("m2"));
        assert_eq!(top.score, 6);
        assert_eq!(top.rank, 1);
    }

    #[tokio::test]
    async fn test_failed_model_degrades_panel_not_run() {
        let gateway = FakeCouncilGateway::new()
            .answer("m1", Ok("answer one"))
            .answer("m2", Err("timeout"))
            .answer("m3", Ok("answer three"))
            .ranking("m1", Ok("FINAL RANKING: A > B"))
            .ranking("m2", Err("timeout"))
            .ranking("m3", Ok("FINAL RANKING: A > B"));

        let cancel = CancellationToken::new();
        let outcome = use_case(gateway)
            .execute(input("q"), &cancel)
            .await
            .unwrap();

        // Exactly one stage-1 entry per requested model
        assert_eq!(outcome.turn.stage1.len(), 3);
        let m2 = outcome
            .turn
            .stage1
            .iter()
            .find(|r| r.model == Model::new("m2"))
            .unwrap();
        assert!(!m2.succeeded);

        // Labels only cover the usable subset
        assert_eq!(outcome.metadata.label_to_model.len(), 2);

        // The failed judge's verdict is marked, not dropped
        let m2_verdict = outcome
            .turn
            .verdicts
            .iter()
            .find(|v| v.judge == Model::new("m2"))
            .unwrap();
        assert!(!m2_verdict.succeeded);

        // Both usable judges ranked A (=m1) first; m2 scores 0, ranked last
        let ranking = &outcome.metadata.aggregate_ranking;
        assert_eq!(ranking[0].model, Model::new("m1"));
        assert_eq!(ranking[0].score, 2);
        assert_eq!(ranking[2].model, Model::new("m2"));
        assert_eq!(ranking[2].score, 0);
    }

    #[tokio::test]
    async fn test_all_failed_still_synthesizes() {
        let gateway = FakeCouncilGateway::new()
            .answer("m1", Err("down"))
            .answer("m2", Err("down"))
            .answer("m3", Err("down"))
            .synthesis(Ok("best effort"));

        let cancel = CancellationToken::new();
        let outcome = use_case(gateway)
            .execute(input("q"), &cancel)
            .await
            .unwrap();

        assert!(outcome.turn.verdicts.is_empty());
        assert!(outcome.metadata.label_to_model.is_empty());
        assert!(outcome.turn.synthesis.succeeded);
        assert_eq!(outcome.turn.stage1.len(), 3);
    }

    #[tokio::test]
    async fn test_chairman_failure_is_recorded_not_raised() {
        let gateway = FakeCouncilGateway::new()
            .answer("m1", Ok("a"))
            .answer("m2", Ok("b"))
            .answer("m3", Ok("c"))
            .ranking("m1", Ok("FINAL RANKING: A > B > C"))
            .ranking("m2", Ok("FINAL RANKING: A > B > C"))
            .ranking("m3", Ok("FINAL RANKING: A > B > C"))
            .synthesis(Err("chairman down"));

        let cancel = CancellationToken::new();
        let outcome = use_case(gateway)
            .execute(input("q"), &cancel)
            .await
            .unwrap();

        assert!(!outcome.turn.synthesis.succeeded);
        assert!(outcome.turn.synthesis.content.contains("chairman down"));
    }

    #[tokio::test]
    async fn test_empty_panel_is_rejected() {
        let gateway = FakeCouncilGateway::new();
        let cancel = CancellationToken::new();
        let input = RunCouncilInput::new(Question::try_new("q").unwrap(), Vec::new());

        let result = use_case(gateway).execute(input, &cancel).await;
        assert!(matches!(result, Err(RunCouncilError::NoModels)));
    }

    #[tokio::test]
    async fn test_judges_see_own_answer_by_default() {
        let gateway = FakeCouncilGateway::new()
            .answer("m1", Ok("the m1 answer text"))
            .answer("m2", Ok("the m2 answer text"))
            .answer("m3", Ok("the m3 answer text"))
            .ranking("m1", Ok("FINAL RANKING: A > B > C"))
            .ranking("m2", Ok("FINAL RANKING: A > B > C"))
            .ranking("m3", Ok("FINAL RANKING: A > B > C"));

        let gateway = Arc::new(gateway);
        let dyn_gateway: Arc<dyn LlmGateway> = gateway.clone();
        let cancel = CancellationToken::new();
        RunCouncilUseCase::new(dyn_gateway)
            .execute(input("q"), &cancel)
            .await
            .unwrap();

        for (judge, prompt) in gateway.ranking_prompts() {
            assert!(
                prompt.contains(&format!("the {} answer text", judge)),
                "judge {} should see its own answer",
                judge
            );
        }
    }

    #[tokio::test]
    async fn test_exclude_own_answer_hides_it_from_the_judge() {
        let gateway = FakeCouncilGateway::new()
            .answer("m1", Ok("the m1 answer text"))
            .answer("m2", Ok("the m2 answer text"))
            .answer("m3", Ok("the m3 answer text"))
            .ranking("m1", Ok("FINAL RANKING: A > B"))
            .ranking("m2", Ok("FINAL RANKING: A > B"))
            .ranking("m3", Ok("FINAL RANKING: A > B"));

        let gateway = Arc::new(gateway);
        let dyn_gateway: Arc<dyn LlmGateway> = gateway.clone();
        let cancel = CancellationToken::new();
        RunCouncilUseCase::new(dyn_gateway)
            .with_exclude_own_answer(true)
            .execute(input("q"), &cancel)
            .await
            .unwrap();

        for (judge, prompt) in gateway.ranking_prompts() {
            assert!(
                !prompt.contains(&format!("the {} answer text", judge)),
                "judge {} should not see its own answer",
                judge
            );
        }
    }

    #[tokio::test]
    async fn test_synthesis_prompt_is_deanonymized() {
        let gateway = FakeCouncilGateway::new()
            .answer("m1", Ok("alpha answer"))
            .answer("m2", Ok("beta answer"))
            .answer("m3", Ok("gamma answer"))
            .ranking("m1", Ok("FINAL RANKING: A > B > C"))
            .ranking("m2", Ok("FINAL RANKING: A > B > C"))
            .ranking("m3", Ok("FINAL RANKING: A > B > C"));

        let gateway = Arc::new(gateway);
        let dyn_gateway: Arc<dyn LlmGateway> = gateway.clone();
        let cancel = CancellationToken::new();
        RunCouncilUseCase::new(dyn_gateway)
            .execute(input("q"), &cancel)
            .await
            .unwrap();

        let prompt = gateway.synthesis_prompt();
        assert!(prompt.contains("--- m1 ---"));
        assert!(prompt.contains("alpha answer"));
        assert!(prompt.contains("score"));
    }

    #[tokio::test]
    async fn test_title_task_reports_through_progress() {
        let gateway = FakeCouncilGateway::new()
            .answer("m1", Ok("a"))
            .answer("m2", Ok("b"))
            .answer("m3", Ok("c"))
            .ranking("m1", Ok("FINAL RANKING: A > B > C"))
            .ranking("m2", Ok("FINAL RANKING: A > B > C"))
            .ranking("m3", Ok("FINAL RANKING: A > B > C"));

        let cancel = CancellationToken::new();
        let progress = RecordingProgress::default();
        let outcome = use_case(gateway)
            .execute_with_progress(
                input("q").with_title_generation(true),
                &cancel,
                &progress,
            )
            .await
            .unwrap();

        assert_eq!(outcome.metadata.title.as_deref(), Some("A Title"));
        assert!(progress.tags().contains(&"title:A Title".to_string()));
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let gateway = FakeCouncilGateway::new()
            .answer("m1", Ok("a"))
            .answer("m2", Ok("b"))
            .answer("m3", Ok("c"))
            .ranking("m1", Ok("FINAL RANKING: A > B > C"))
            .ranking("m2", Ok("FINAL RANKING: A > B > C"))
            .ranking("m3", Ok("FINAL RANKING: A > B > C"));

        let cancel = CancellationToken::new();
        let progress = RecordingProgress::default();
        use_case(gateway)
            .execute_with_progress(input("q"), &cancel, &progress)
            .await
            .unwrap();

        let tags = progress.tags();
        let position = |tag: &str| tags.iter().position(|t| t == tag).unwrap();
        assert!(position("stage1_start:3") < position("stage1_complete"));
        assert!(position("stage1_complete") < position("stage2_start:3"));
        assert!(position("stage2_complete") < position("stage3_start:1"));
        assert!(position("stage3_start:1") < position("stage3_complete"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_mid_collection() {
        struct HangingGateway;

        #[async_trait]
        impl LlmGateway for HangingGateway {
            async fn complete(
                &self,
                _model: &Model,
                _messages: &[Message],
            ) -> Result<Completion, GatewayError> {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let use_case = RunCouncilUseCase::new(Arc::new(HangingGateway));
        let result = use_case.execute(input("q"), &cancel).await;
        assert!(matches!(result, Err(RunCouncilError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_title_task() {
        use std::sync::atomic::{AtomicBool, Ordering};

        /// Panel calls hang; the title call resolves after 30s and flags it.
        struct SlowTitleGateway {
            title_resolved: Arc<AtomicBool>,
        }

        #[async_trait]
        impl LlmGateway for SlowTitleGateway {
            async fn complete(
                &self,
                _model: &Model,
                messages: &[Message],
            ) -> Result<Completion, GatewayError> {
                if messages[0].content.contains("conversation titles") {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    self.title_resolved.store(true, Ordering::SeqCst);
                    return Ok(Completion::new("A Title"));
                }
                std::future::pending::<()>().await;
                unreachable!()
            }
        }

        let title_resolved = Arc::new(AtomicBool::new(false));
        let gateway = SlowTitleGateway {
            title_resolved: Arc::clone(&title_resolved),
        };

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let use_case = RunCouncilUseCase::new(Arc::new(gateway));
        let result = use_case
            .execute(input("q").with_title_generation(true), &cancel)
            .await;
        assert!(matches!(result, Err(RunCouncilError::Cancelled)));

        // The detached title call would resolve at t=30s if it were
        // still running; the cancelled run must have aborted it.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!title_resolved.load(Ordering::SeqCst));
    }
}
