//! CLI entrypoint for llm-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{
    ConversationStore, PersistTarget, RunCouncilError, RunCouncilInput, RunCouncilUseCase,
    StaticSettings, StoreError, StreamCouncilUseCase, UserSettings,
};
use council_domain::{CouncilEvent, Model, Question};
use council_infrastructure::{
    ConfigLoader, FileConfig, GigaChatAdapter, JsonConversationStore, LinkPreviewEnricher,
    OpenRouterAdapter, ProviderAdapter, ProviderKind, RoutingGateway, YandexAdapter,
};
use council_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting llm-council");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    let Some(question) = Question::try_new(&cli.question) else {
        bail!("Question must not be empty");
    };

    let panel: Vec<Model> = if cli.model.is_empty() {
        config.panel()
    } else {
        cli.model.iter().map(Model::new).collect()
    };
    let chairman = cli
        .chairman
        .as_deref()
        .map(Model::new)
        .unwrap_or_else(|| config.chairman());

    // === Dependency Injection ===
    let gateway = Arc::new(build_gateway(&config));
    let store: Arc<dyn ConversationStore> =
        Arc::new(JsonConversationStore::new(&config.storage.data_dir));

    let settings = StaticSettings::new(UserSettings {
        base_prompt: config.prompts.base_prompt.clone(),
        personal_prompt: config.prompts.personal_prompt.clone(),
    });

    let mut use_case = RunCouncilUseCase::new(gateway)
        .with_settings(Arc::new(settings))
        .with_timing(config.timing())
        .with_exclude_own_answer(config.council.exclude_own_answer);
    if !cli.no_enrich {
        use_case = use_case.with_enricher(Arc::new(LinkPreviewEnricher::new()));
    }

    let input = RunCouncilInput::new(question, panel)
        .with_chairman(Some(chairman))
        .with_owner(&cli.owner)
        .with_title_generation(!cli.no_title);

    // Make sure the target conversation exists before the run starts
    if let Some(conversation_id) = &cli.conversation {
        ensure_conversation(store.as_ref(), &cli.owner, conversation_id).await?;
    }

    if cli.stream {
        return run_streaming(use_case, input, store, &cli, &config).await;
    }

    // Cancellation maps Ctrl-C onto the run; partial results are still
    // persisted by the streaming path only.
    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    if !cli.quiet {
        println!();
        println!("Question: {}", input.question.content());
        println!(
            "Panel: {}",
            input
                .panel
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
    }

    let result = if cli.quiet {
        use_case.execute(input.clone(), &cancel).await
    } else {
        let progress = ProgressReporter::new();
        use_case
            .execute_with_progress(input.clone(), &cancel, &progress)
            .await
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(RunCouncilError::Cancelled) => bail!("Run cancelled"),
        Err(e) => return Err(e.into()),
    };

    if let Some(conversation_id) = &cli.conversation {
        store
            .add_user_message(&cli.owner, conversation_id, &outcome.turn.question)
            .await?;
        store
            .append_turn(&cli.owner, conversation_id, &outcome.turn)
            .await?;
        if let Some(title) = &outcome.metadata.title {
            store.update_title(&cli.owner, conversation_id, title).await?;
        }
    }

    let output = match cli.output {
        OutputFormat::Full => ConsoleFormatter::format(&outcome),
        OutputFormat::Synthesis => ConsoleFormatter::format_synthesis_only(&outcome),
        OutputFormat::Json => ConsoleFormatter::format_json(&outcome),
    };

    println!("{}", output);

    Ok(())
}

/// Build the provider stack from configuration and environment credentials.
///
/// Every adapter is always registered; one without credentials fails its
/// own calls only, which degrades that panel seat instead of the run.
fn build_gateway(config: &FileConfig) -> RoutingGateway {
    let openrouter_key = std::env::var("OPENROUTER_API_KEY").unwrap_or_default();
    let gigachat_token = std::env::var("GIGACHAT_ACCESS_TOKEN").unwrap_or_default();
    let yandex_key = std::env::var("YANDEX_API_KEY").unwrap_or_default();
    let yandex_folder = std::env::var("YANDEX_FOLDER_ID").unwrap_or_default();

    let providers: Vec<Arc<dyn ProviderAdapter>> = vec![
        Arc::new(OpenRouterAdapter::new(openrouter_key)),
        Arc::new(
            GigaChatAdapter::new(gigachat_token)
                .with_serialized_requests(config.providers.gigachat_serialize_requests),
        ),
        Arc::new(YandexAdapter::new(yandex_key, yandex_folder)),
    ];

    let default_kind = ProviderKind::from_prefix(&config.providers.default).unwrap_or_else(|| {
        warn!(
            default = %config.providers.default,
            "Unknown default provider, using openrouter"
        );
        ProviderKind::OpenRouter
    });

    RoutingGateway::new(providers).with_default(default_kind)
}

async fn ensure_conversation(
    store: &dyn ConversationStore,
    owner: &str,
    conversation_id: &str,
) -> Result<()> {
    match store.get(owner, conversation_id).await {
        Ok(_) => Ok(()),
        Err(StoreError::NotFound(_)) => {
            store.create(owner, conversation_id).await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_streaming(
    use_case: RunCouncilUseCase,
    input: RunCouncilInput,
    store: Arc<dyn ConversationStore>,
    cli: &Cli,
    config: &FileConfig,
) -> Result<()> {
    let streaming = StreamCouncilUseCase::new(Arc::new(use_case))
        .with_store(store)
        .with_heartbeat(config.heartbeat());

    let persist = cli.conversation.as_ref().map(|id| PersistTarget {
        owner: cli.owner.clone(),
        conversation_id: id.clone(),
    });

    let (rx, cancel) = streaming.execute(input, persist);
    spawn_ctrl_c_handler(cancel);

    match council_presentation::print_event_stream(rx).await {
        Some(CouncilEvent::Error { message }) => bail!("Council run failed: {message}"),
        Some(_) => Ok(()),
        None => bail!("Run cancelled"),
    }
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, cancelling run");
            cancel.cancel();
        }
    });
}
