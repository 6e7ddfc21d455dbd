//! Stream Council use case
//!
//! Wraps [`RunCouncilUseCase`] for transport over a long-lived push channel.
//! Progress callbacks become typed events on an outbound channel, an idle
//! heartbeat keeps intermediaries from closing the connection, and client
//! disconnection turns into cooperative cancellation with partial
//! persistence.

use crate::ports::progress::CouncilProgress;
use crate::ports::store::ConversationStore;
use crate::use_cases::run_council::{
    CouncilOutcome, RunCouncilError, RunCouncilInput, RunCouncilUseCase,
};
use council_domain::{
    CouncilEvent, CouncilTurn, LabelMap, Model, RankedModel, RankingVerdict, Stage,
    StageOneResponse, SynthesisResult,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Progress adapter that forwards pipeline callbacks as channel events
struct ChannelProgress {
    tx: mpsc::UnboundedSender<CouncilEvent>,
}

impl ChannelProgress {
    fn send(&self, event: CouncilEvent) {
        // The driver owning the receiver decides what to do on overflow or
        // disconnect; a closed channel here just means the run is winding down.
        let _ = self.tx.send(event);
    }
}

impl CouncilProgress for ChannelProgress {
    fn on_stage_start(&self, stage: Stage, models: &[Model]) {
        let event = match stage {
            Stage::Collect => CouncilEvent::Stage1Start {
                models: models.to_vec(),
            },
            Stage::Rank => CouncilEvent::Stage2Start {
                models: models.to_vec(),
            },
            Stage::Synthesize => CouncilEvent::Stage3Start,
        };
        self.send(event);
    }

    fn on_model_complete(&self, stage: Stage, model: &Model, _success: bool) {
        let event = match stage {
            Stage::Collect => Some(CouncilEvent::Stage1ModelComplete {
                model: model.clone(),
            }),
            Stage::Rank => Some(CouncilEvent::Stage2ModelComplete {
                model: model.clone(),
            }),
            // The synthesis result event already carries the outcome
            Stage::Synthesize => None,
        };
        if let Some(event) = event {
            self.send(event);
        }
    }

    fn on_stage_complete(&self, _stage: Stage) {}

    fn on_stage1_complete(&self, results: &[StageOneResponse]) {
        self.send(CouncilEvent::Stage1Complete {
            results: results.to_vec(),
        });
    }

    fn on_stage2_complete(
        &self,
        verdicts: &[RankingVerdict],
        labels: &LabelMap,
        aggregate: &[RankedModel],
    ) {
        self.send(CouncilEvent::stage2_complete(
            verdicts.to_vec(),
            labels,
            aggregate.to_vec(),
        ));
    }

    fn on_stage3_complete(&self, result: &SynthesisResult) {
        self.send(CouncilEvent::Stage3Complete {
            result: result.clone(),
        });
    }

    fn on_title_complete(&self, title: &str) {
        self.send(CouncilEvent::TitleComplete {
            title: title.to_string(),
        });
    }
}

/// Where to persist the turn once it completes (or is interrupted)
#[derive(Debug, Clone)]
pub struct PersistTarget {
    pub owner: String,
    pub conversation_id: String,
}

/// Use case for running a council request as an event stream
pub struct StreamCouncilUseCase {
    inner: Arc<RunCouncilUseCase>,
    store: Option<Arc<dyn ConversationStore>>,
    heartbeat: Duration,
}

impl StreamCouncilUseCase {
    pub fn new(inner: Arc<RunCouncilUseCase>) -> Self {
        Self {
            inner,
            store: None,
            heartbeat: Duration::from_secs(15),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    /// Start the run and return its event stream plus a cancellation handle.
    ///
    /// The stream closes after a terminal `complete`/`error` event, or
    /// without one when the run was cancelled. Dropping the receiver is
    /// equivalent to cancelling: the driver notices the closed channel on
    /// the next event or heartbeat and stops issuing provider calls.
    pub fn execute(
        &self,
        input: RunCouncilInput,
        persist: Option<PersistTarget>,
    ) -> (mpsc::Receiver<CouncilEvent>, CancellationToken) {
        let (out_tx, out_rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();

        let inner = Arc::clone(&self.inner);
        let store = self.store.clone();
        let heartbeat_period = self.heartbeat;
        let driver_cancel = cancel.clone();

        tokio::spawn(async move {
            drive_stream(
                inner,
                input,
                store,
                persist,
                out_tx,
                driver_cancel,
                heartbeat_period,
            )
            .await;
        });

        (out_rx, cancel)
    }
}

async fn drive_stream(
    inner: Arc<RunCouncilUseCase>,
    input: RunCouncilInput,
    store: Option<Arc<dyn ConversationStore>>,
    persist: Option<PersistTarget>,
    out_tx: mpsc::Sender<CouncilEvent>,
    cancel: CancellationToken,
    heartbeat_period: Duration,
) {
    let question = input.question.content().to_string();
    let chairman = input.effective_chairman();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let pipeline_cancel = cancel.clone();
    let pipeline = tokio::spawn(async move {
        let progress = ChannelProgress { tx: event_tx };
        inner
            .execute_with_progress(input, &pipeline_cancel, &progress)
            .await
    });

    // Stage-1 results are tracked so an interrupted run can still persist them
    let mut stage1_seen: Option<Vec<StageOneResponse>> = None;

    let mut heartbeat = tokio::time::interval(heartbeat_period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.reset();

    loop {
        tokio::select! {
            maybe = event_rx.recv() => match maybe {
                Some(event) => {
                    heartbeat.reset();
                    if let CouncilEvent::Stage1Complete { results } = &event {
                        stage1_seen = Some(results.clone());
                    }
                    if out_tx.send(event).await.is_err() {
                        info!("Client disconnected, cancelling council run");
                        cancel.cancel();
                    }
                }
                None => break,
            },
            _ = heartbeat.tick() => {
                if out_tx.send(CouncilEvent::Heartbeat).await.is_err() {
                    info!("Client disconnected, cancelling council run");
                    cancel.cancel();
                }
            }
        }
    }

    match pipeline.await {
        Ok(Ok(outcome)) => {
            match persist_outcome(&store, &persist, &question, &outcome).await {
                Ok(()) => {
                    let _ = out_tx.send(CouncilEvent::Complete).await;
                }
                Err(message) => {
                    let _ = out_tx.send(CouncilEvent::Error { message }).await;
                }
            }
        }
        Ok(Err(RunCouncilError::Cancelled)) => {
            // Stage-2 partials are intermediate and never persisted alone
            if let Some(stage1) = stage1_seen {
                let turn = CouncilTurn::interrupted(question.clone(), stage1, chairman);
                if let Err(message) =
                    persist_turn(&store, &persist, &question, &turn, None).await
                {
                    warn!(error = %message, "Failed to persist interrupted turn");
                }
            }
            // Cancellation is not an error; the stream just closes
        }
        Ok(Err(e)) => {
            let _ = out_tx
                .send(CouncilEvent::Error {
                    message: e.to_string(),
                })
                .await;
        }
        Err(e) => {
            error!(error = %e, "Council pipeline task panicked");
            let _ = out_tx
                .send(CouncilEvent::Error {
                    message: "internal pipeline failure".to_string(),
                })
                .await;
        }
    }
}

async fn persist_outcome(
    store: &Option<Arc<dyn ConversationStore>>,
    persist: &Option<PersistTarget>,
    question: &str,
    outcome: &CouncilOutcome,
) -> Result<(), String> {
    persist_turn(
        store,
        persist,
        question,
        &outcome.turn,
        outcome.metadata.title.as_deref(),
    )
    .await
}

async fn persist_turn(
    store: &Option<Arc<dyn ConversationStore>>,
    persist: &Option<PersistTarget>,
    question: &str,
    turn: &CouncilTurn,
    title: Option<&str>,
) -> Result<(), String> {
    let (store, target) = match (store, persist) {
        (Some(store), Some(target)) => (store, target),
        _ => return Ok(()),
    };

    store
        .add_user_message(&target.owner, &target.conversation_id, question)
        .await
        .map_err(|e| e.to_string())?;
    store
        .append_turn(&target.owner, &target.conversation_id, turn)
        .await
        .map_err(|e| e.to_string())?;
    if let Some(title) = title {
        store
            .update_title(&target.owner, &target.conversation_id, title)
            .await
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}
