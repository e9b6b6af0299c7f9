//! Shared Session State
//!
//! This module defines the `Session` struct, created once at startup and shared
//! between the keyboard shell and the listening loop. The router sits behind an
//! async mutex so utterances from both sources are handled one at a time.

use crate::console::Console;
use crate::listener;
use crate::speech::{SpeechInput, SpeechOutput};
use luna_core::command::normalize_utterance;
use luna_core::error::RegistryError;
use luna_core::router::{Reply, Router};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub const GREETING: &str = "Bem-vindo à Luna!";
pub const GREETING_SPOKEN: &str = "Bem-vindo à Luna! Como posso ajudá-lo hoje?";
pub const COMMAND_NOT_FOUND: &str = "Comando não encontrado.";
pub const EMPTY_FIELDS: &str = "Preencha o comando e a descrição.";
pub const SAVE_FAILED: &str = "Não foi possível salvar os comandos.";
pub const LISTENING_UNAVAILABLE: &str = "O reconhecimento de voz não está configurado.";

pub struct Session {
    router: Mutex<Router>,
    speaker: Arc<dyn SpeechOutput>,
    console: Arc<dyn Console>,
    transcriber: Option<Arc<dyn SpeechInput>>,
    listen_retry: Duration,
    listening: StdMutex<Option<CancellationToken>>,
}

impl Session {
    pub fn new(
        router: Router,
        speaker: Arc<dyn SpeechOutput>,
        console: Arc<dyn Console>,
        transcriber: Option<Arc<dyn SpeechInput>>,
        listen_retry: Duration,
    ) -> Self {
        Self {
            router: Mutex::new(router),
            speaker,
            console,
            transcriber,
            listen_retry,
            listening: StdMutex::new(None),
        }
    }

    pub fn console(&self) -> &Arc<dyn Console> {
        &self.console
    }

    /// Appends `line` to the console and speaks `spoken`.
    pub async fn announce(&self, line: &str, spoken: &str) {
        self.console.append(line);
        self.speaker.speak(spoken).await;
    }

    pub async fn greet(&self) {
        self.announce(GREETING, GREETING_SPOKEN).await;
    }

    /// Routes one utterance and presents the reply.
    pub async fn handle(&self, utterance: &str) -> Reply {
        let utterance = normalize_utterance(utterance);
        let reply = self.router.lock().await.handle(&utterance).await;
        self.announce(&reply.console_line(), reply.speech()).await;
        reply
    }

    pub async fn add_command(&self, key: &str, description: &str) {
        let result = self.router.lock().await.add_command(key, description);
        let line = match result {
            Ok(()) => format!("Comando '{}' adicionado com sucesso.", normalize_utterance(key)),
            Err(e) => self.registry_failure(e),
        };
        self.console.append(&line);
    }

    pub async fn remove_command(&self, key: &str) {
        let result = self.router.lock().await.remove_command(key);
        let line = match result {
            Ok(_) => format!("Comando '{}' removido com sucesso.", normalize_utterance(key)),
            Err(e) => self.registry_failure(e),
        };
        self.console.append(&line);
    }

    fn registry_failure(&self, err: RegistryError) -> String {
        match err {
            RegistryError::Validation(reason) => {
                warn!(reason = %reason, "Rejected command edit");
                EMPTY_FIELDS.to_string()
            }
            RegistryError::NotFound(_) => COMMAND_NOT_FOUND.to_string(),
            RegistryError::Persistence(e) => {
                error!(error = %e, "Command table could not be saved");
                SAVE_FAILED.to_string()
            }
        }
    }

    pub async fn list_commands(&self) {
        let commands = self.router.lock().await.commands();
        let mut text = String::from("Comandos disponíveis:");
        for (key, description) in commands {
            text.push('\n');
            text.push_str(&format!("{}: {}", key, description));
        }
        self.console.append(&text);
    }

    pub fn is_listening(&self) -> bool {
        self.listening_slot().is_some()
    }

    fn listening_slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        match self.listening.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Starts the listening loop unless it is already running.
    pub async fn start_listening(self: &Arc<Self>) {
        let Some(transcriber) = self.transcriber.clone() else {
            self.console.append(LISTENING_UNAVAILABLE);
            return;
        };

        let token = {
            let mut slot = self.listening_slot();
            if slot.is_some() {
                return;
            }
            let token = CancellationToken::new();
            *slot = Some(token.clone());
            token
        };

        self.announce("Escutando...", "Estou escutando.").await;
        info!("Listening started");
        tokio::spawn(listener::run(
            Arc::clone(self),
            transcriber,
            token,
            self.listen_retry,
        ));
    }

    /// Cancels the listening loop at once; a transcription in flight is dropped.
    pub async fn stop_listening(&self) {
        let token = self.listening_slot().take();
        if let Some(token) = token {
            token.cancel();
            info!("Listening stopped");
        }
        self.announce("Parando de escutar...", "Parando de escutar.").await;
    }
}
