//! Continuous voice listening loop.

use crate::speech::{SpeechError, SpeechInput};
use crate::state::Session;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const NOT_UNDERSTOOD: &str = "Não consegui entender o que você disse.";
pub const RECOGNITION_SERVICE_ERROR: &str =
    "Erro na conexão com o serviço de reconhecimento de voz.";

/// Listens, handles, waits `retry`, repeats until `token` is cancelled.
///
/// Cancellation wins over both the pending transcription and the retry delay,
/// and an utterance heard after cancellation is discarded.
pub async fn run(
    session: Arc<Session>,
    transcriber: Arc<dyn SpeechInput>,
    token: CancellationToken,
    retry: Duration,
) {
    loop {
        let heard = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            heard = transcriber.listen() => heard,
        };

        match heard {
            Ok(utterance) => {
                if token.is_cancelled() {
                    break;
                }
                let utterance = utterance.to_lowercase();
                debug!(utterance = %utterance, "Speech recognised");
                session
                    .console()
                    .append(&format!("Comando reconhecido: {}", utterance));
                session.handle(&utterance).await;
            }
            Err(SpeechError::NoSpeechDetected) => {
                session.console().append(NOT_UNDERSTOOD);
            }
            Err(SpeechError::Service(reason)) => {
                warn!(reason = %reason, "Speech recognition failed");
                session.console().append(RECOGNITION_SERVICE_ERROR);
            }
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(retry) => {}
        }
    }
    info!("Listening loop finished");
}
