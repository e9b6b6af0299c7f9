//! Wiring of the session from configuration.

use crate::config::{Config, FallbackSource};
use crate::console::Console;
use crate::launcher::SystemLauncher;
use crate::speech::{CommandSpeaker, CommandTranscriber, SilentSpeaker, SpeechInput, SpeechOutput};
use crate::state::Session;
use crate::store::{JsonCommandStore, load_corpus};
use anyhow::{Context, Result};
use luna_core::completion::{CompletionClient, CompletionConfig};
use luna_core::fallback::{LocalResponder, ResponseSource};
use luna_core::predictor::{PredictorConfig, SequencePredictor};
use luna_core::registry::CommandRegistry;
use luna_core::router::Router;
use luna_core::vocabulary::Tokenizer;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Trains the local predictor on the configured corpus off the async runtime.
pub async fn train_local_predictor(config: &Config) -> Result<SequencePredictor> {
    let lines = load_corpus(&config.corpus_path)
        .with_context(|| format!("Failed to read corpus {}", config.corpus_path.display()))?;
    let tokenizer = Tokenizer::new(config.tokenizer_fold_case);
    let predictor_config = PredictorConfig {
        epochs: config.training_epochs,
        ..PredictorConfig::default()
    };
    info!(lines = lines.len(), epochs = predictor_config.epochs, "Training local predictor");

    let predictor = tokio::task::spawn_blocking(move || {
        SequencePredictor::from_corpus(&lines, tokenizer, predictor_config)
    })
    .await
    .context("Training task panicked")??;
    Ok(predictor)
}

fn remote_client(config: &Config) -> Result<CompletionClient> {
    let api_key = config
        .completion_api_key
        .clone()
        .context("COMPLETION_API_KEY is not set")?;
    let completion = CompletionConfig {
        url: config.completion_api_url.clone(),
        api_host: config.completion_api_host.clone(),
        model: config.chat_model.clone(),
        max_tokens: config.completion_max_tokens,
        temperature: config.completion_temperature,
        timeout: config.completion_timeout,
        ..CompletionConfig::new(api_key)
    };
    Ok(CompletionClient::new(completion)?)
}

/// Builds the conversation-mode response source, or `None` when conversation
/// mode has to be disabled.
pub async fn build_fallback(config: &Config) -> Option<Arc<dyn ResponseSource>> {
    match config.fallback_source {
        FallbackSource::Remote => match remote_client(config) {
            Ok(client) => {
                info!(model = %config.chat_model, "Using the remote completion service");
                return Some(Arc::new(client));
            }
            Err(e) => {
                error!(error = %e, "Remote completion client unavailable, trying the local predictor")
            }
        },
        FallbackSource::Local => info!("Using the local predictor"),
    }

    match train_local_predictor(config).await {
        Ok(predictor) => Some(Arc::new(LocalResponder::new(Arc::new(predictor)))),
        Err(e) => {
            warn!(error = %e, "Conversation mode disabled");
            None
        }
    }
}

/// Loads the command table and assembles the session around the given console.
pub async fn build_session(config: &Config, console: Arc<dyn Console>) -> Result<Arc<Session>> {
    let store = JsonCommandStore::new(&config.commands_path);
    let registry = CommandRegistry::load(Box::new(store)).with_context(|| {
        format!(
            "Failed to load command table {}",
            config.commands_path.display()
        )
    })?;

    let fallback = build_fallback(config).await;
    let router = Router::new(registry, Arc::new(SystemLauncher), fallback)
        .with_fallback_timeout(config.completion_timeout);

    let speaker: Arc<dyn SpeechOutput> = match &config.tts_cmd {
        Some(cmd) => Arc::new(CommandSpeaker::new(cmd.clone(), config.tts_voice.clone())),
        None => Arc::new(SilentSpeaker),
    };
    let transcriber = config
        .transcriber_cmd
        .as_ref()
        .map(|cmd| Arc::new(CommandTranscriber::new(cmd.clone())) as Arc<dyn SpeechInput>);

    Ok(Arc::new(Session::new(
        router,
        speaker,
        console,
        transcriber,
        config.listen_retry,
    )))
}
