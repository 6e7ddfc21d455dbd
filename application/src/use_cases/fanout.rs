//! Parallel fanout over a set of models.
//!
//! Dispatches the same logical call to every model concurrently, enforces a
//! per-call deadline, isolates per-call failure, and reports each completion
//! as it resolves. This is the single concurrency primitive shared by the
//! collection and ranking stages.

use crate::ports::llm_gateway::{Completion, GatewayError, LlmGateway};
use council_domain::{Message, Model};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Errors that abort a fanout as a whole
#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("No models to query")]
    NoModels,

    #[error("Cancelled")]
    Cancelled,
}

/// Query every model concurrently and collect all results.
///
/// Each call gets its own message list from `build_request` (judge prompts
/// differ per judge) and its own independent `per_call_timeout`; a call that
/// exceeds it is abandoned and recorded as [`GatewayError::Timeout`] without
/// affecting its siblings. `on_each` fires exactly once per resolved call,
/// in completion order, before `fan_out` returns.
///
/// Returns only after every call has resolved or timed out. Cancellation is
/// the one early exit: in-flight calls are aborted and already-resolved
/// results are discarded by the caller.
pub async fn fan_out<B, F>(
    gateway: &Arc<dyn LlmGateway>,
    models: &[Model],
    mut build_request: B,
    per_call_timeout: Duration,
    cancel: &CancellationToken,
    mut on_each: F,
) -> Result<HashMap<Model, Result<Completion, GatewayError>>, FanoutError>
where
    B: FnMut(&Model) -> Vec<Message>,
    F: FnMut(&Model, bool),
{
    if models.is_empty() {
        return Err(FanoutError::NoModels);
    }

    let mut join_set = JoinSet::new();

    for model in models {
        let gateway = Arc::clone(gateway);
        let messages = build_request(model);
        let model = model.clone();

        join_set.spawn(async move {
            let result = match tokio::time::timeout(
                per_call_timeout,
                gateway.complete(&model, &messages),
            )
            .await
            {
                Ok(Ok(completion)) => Ok(completion),
                Ok(Err(e)) => {
                    warn!(model = %model, error = %e, "Model call failed");
                    Err(e)
                }
                Err(_) => {
                    warn!(model = %model, timeout = ?per_call_timeout, "Model call timed out");
                    Err(GatewayError::Timeout)
                }
            };
            (model, result)
        });
    }

    let mut results = HashMap::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                join_set.abort_all();
                return Err(FanoutError::Cancelled);
            }
            joined = join_set.join_next() => {
                match joined {
                    Some(Ok((model, result))) => {
                        on_each(&model, result.is_ok());
                        results.insert(model, result);
                    }
                    Some(Err(e)) => {
                        warn!("Task join error: {}", e);
                    }
                    None => break,
                }
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use council_domain::Role;
    use std::sync::Mutex;

    /// Gateway scripted per model: answer, fail, or hang forever.
    struct ScriptedGateway {
        script: HashMap<String, ScriptedCall>,
    }

    enum ScriptedCall {
        Answer(String),
        Fail(String),
        Hang,
        DelayedAnswer(Duration, String),
    }

    impl ScriptedGateway {
        fn new(script: Vec<(&str, ScriptedCall)>) -> Arc<dyn LlmGateway> {
            Arc::new(Self {
                script: script
                    .into_iter()
                    .map(|(m, c)| (m.to_string(), c))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn complete(
            &self,
            model: &Model,
            _messages: &[Message],
        ) -> Result<Completion, GatewayError> {
            match self.script.get(model.as_str()) {
                Some(ScriptedCall::Answer(content)) => Ok(Completion::new(content.clone())),
                Some(ScriptedCall::Fail(reason)) => {
                    Err(GatewayError::RequestFailed(reason.clone()))
                }
                Some(ScriptedCall::Hang) => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                Some(ScriptedCall::DelayedAnswer(delay, content)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(Completion::new(content.clone()))
                }
                None => Err(GatewayError::NoProvider(model.to_string())),
            }
        }
    }

    fn question(model: &Model) -> Vec<Message> {
        vec![
            Message::system("You are a test."),
            Message::user(format!("Question for {}", model)),
        ]
    }

    #[tokio::test]
    async fn test_all_models_resolve() {
        let gateway = ScriptedGateway::new(vec![
            ("m1", ScriptedCall::Answer("one".into())),
            ("m2", ScriptedCall::Answer("two".into())),
        ]);
        let models = vec![Model::new("m1"), Model::new("m2")];
        let cancel = CancellationToken::new();

        let results = fan_out(
            &gateway,
            &models,
            question,
            Duration::from_secs(5),
            &cancel,
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            results[&Model::new("m1")].as_ref().unwrap().content,
            "one"
        );
        assert_eq!(
            results[&Model::new("m2")].as_ref().unwrap().content,
            "two"
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_siblings() {
        let gateway = ScriptedGateway::new(vec![
            ("good", ScriptedCall::Answer("fine".into())),
            ("bad", ScriptedCall::Fail("boom".into())),
        ]);
        let models = vec![Model::new("good"), Model::new("bad")];
        let cancel = CancellationToken::new();

        let seen = Mutex::new(Vec::new());
        let results = fan_out(
            &gateway,
            &models,
            question,
            Duration::from_secs(5),
            &cancel,
            |model, success| seen.lock().unwrap().push((model.clone(), success)),
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[&Model::new("good")].is_ok());
        assert!(results[&Model::new("bad")].is_err());

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&(Model::new("good"), true)));
        assert!(seen.contains(&(Model::new("bad"), false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_call_timeout_is_independent() {
        let gateway = ScriptedGateway::new(vec![
            ("slow", ScriptedCall::Hang),
            (
                "steady",
                ScriptedCall::DelayedAnswer(Duration::from_secs(2), "done".into()),
            ),
        ]);
        let models = vec![Model::new("slow"), Model::new("steady")];
        let cancel = CancellationToken::new();

        let results = fan_out(
            &gateway,
            &models,
            question,
            Duration::from_secs(10),
            &cancel,
            |_, _| {},
        )
        .await
        .unwrap();

        assert!(matches!(
            results[&Model::new("slow")],
            Err(GatewayError::Timeout)
        ));
        assert_eq!(
            results[&Model::new("steady")].as_ref().unwrap().content,
            "done"
        );
    }

    #[tokio::test]
    async fn test_empty_model_list_is_a_caller_error() {
        let gateway = ScriptedGateway::new(vec![]);
        let cancel = CancellationToken::new();

        let result = fan_out(
            &gateway,
            &[],
            question,
            Duration::from_secs(1),
            &cancel,
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(FanoutError::NoModels)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_in_flight_calls() {
        let gateway = ScriptedGateway::new(vec![("stuck", ScriptedCall::Hang)]);
        let models = vec![Model::new("stuck")];
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let result = fan_out(
            &gateway,
            &models,
            question,
            Duration::from_secs(60),
            &cancel,
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(FanoutError::Cancelled)));
    }

    #[tokio::test]
    async fn test_request_builder_runs_per_model() {
        let gateway = ScriptedGateway::new(vec![
            ("m1", ScriptedCall::Answer("one".into())),
            ("m2", ScriptedCall::Answer("two".into())),
        ]);
        let models = vec![Model::new("m1"), Model::new("m2")];
        let cancel = CancellationToken::new();

        let mut built = Vec::new();
        fan_out(
            &gateway,
            &models,
            |model| {
                built.push(model.clone());
                question(model)
            },
            Duration::from_secs(5),
            &cancel,
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(built, models);
    }

    #[test]
    fn test_messages_carry_roles() {
        let messages = question(&Model::new("m1"));
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }
}
