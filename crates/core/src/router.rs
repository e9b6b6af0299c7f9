//! Utterance Router
//!
//! Maps one normalized utterance to a scripted command, a conversation-mode
//! response, or the fixed "not recognized" reply. The router owns the command
//! registry and the conversation state; side effects and free-form answers are
//! delegated to the [`ActionLauncher`] and [`ResponseSource`] collaborators.

use crate::command::{CommandDescriptor, CommandKind, normalize_utterance};
use crate::conversation::ConversationState;
use crate::error::RegistryError;
use crate::fallback::ResponseSource;
use crate::registry::CommandRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const NOT_RECOGNIZED: &str = "Comando não reconhecido.";
pub const NOT_RECOGNIZED_SPOKEN: &str = "Desculpe, não entendi o comando.";
pub const REMOTE_UNAVAILABLE: &str = "Desculpe, não consegui me conectar ao serviço remoto.";
pub const CONVERSATION_UNAVAILABLE: &str = "O modo de conversa está indisponível.";

/// Upper bound on a single fallback answer.
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Side effects behind the scripted command kinds.
#[cfg_attr(test, mockall::automock)]
pub trait ActionLauncher: Send + Sync {
    /// Opens a URL or a browser program.
    fn open_browser(&self, target: &str) -> anyhow::Result<()>;
    fn open_folder(&self, path: &str) -> anyhow::Result<()>;
    fn eye_control(&self) -> anyhow::Result<()>;
    fn forecast(&self) -> anyhow::Result<()>;
}

/// A launcher that only logs what it would do.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLauncher;

impl ActionLauncher for NoopLauncher {
    fn open_browser(&self, target: &str) -> anyhow::Result<()> {
        info!(target = %target, "Browser action skipped");
        Ok(())
    }

    fn open_folder(&self, path: &str) -> anyhow::Result<()> {
        info!(path = %path, "Folder action skipped");
        Ok(())
    }

    fn eye_control(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn forecast(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Outcome of routing one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A registered command ran.
    Scripted {
        key: String,
        kind: CommandKind,
        text: String,
    },
    /// Conversation mode answered.
    Conversational(String),
    /// Nothing matched and conversation mode is off.
    Unrecognized,
    /// Conversation mode was requested but no fallback source exists.
    Unavailable,
}

impl Reply {
    /// The text emitted for this reply.
    pub fn text(&self) -> &str {
        match self {
            Reply::Scripted { text, .. } => text,
            Reply::Conversational(text) => text,
            Reply::Unrecognized => NOT_RECOGNIZED,
            Reply::Unavailable => CONVERSATION_UNAVAILABLE,
        }
    }

    /// The line appended to the console.
    pub fn console_line(&self) -> String {
        match self {
            Reply::Conversational(text) => format!("Luna: {}", text),
            other => other.text().to_string(),
        }
    }

    /// What the speech output should say.
    pub fn speech(&self) -> &str {
        match self {
            Reply::Unrecognized => NOT_RECOGNIZED_SPOKEN,
            other => other.text(),
        }
    }
}

pub struct Router {
    registry: CommandRegistry,
    state: ConversationState,
    launcher: Arc<dyn ActionLauncher>,
    fallback: Option<Arc<dyn ResponseSource>>,
    fallback_timeout: Duration,
}

impl Router {
    /// Creates a router in the `Idle` state.
    ///
    /// Without a `fallback` source conversation mode cannot be entered.
    pub fn new(
        registry: CommandRegistry,
        launcher: Arc<dyn ActionLauncher>,
        fallback: Option<Arc<dyn ResponseSource>>,
    ) -> Self {
        Self {
            registry,
            state: ConversationState::Idle,
            launcher,
            fallback,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
        }
    }

    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = timeout;
        self
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Routes one utterance.
    pub async fn handle(&mut self, utterance: &str) -> Reply {
        let key = normalize_utterance(utterance);

        if let Some(descriptor) = self.registry.lookup(&key).cloned() {
            return self.execute(key, descriptor);
        }

        if !self.state.is_conversing() {
            debug!(utterance = %key, "No command matched");
            return Reply::Unrecognized;
        }

        let Some(source) = self.fallback.clone() else {
            return Reply::Unavailable;
        };
        match tokio::time::timeout(self.fallback_timeout, source.respond(&key)).await {
            Ok(Ok(text)) => Reply::Conversational(text),
            Ok(Err(e)) => {
                warn!(error = %e, "Fallback response source failed");
                Reply::Conversational(REMOTE_UNAVAILABLE.to_string())
            }
            Err(_) => {
                warn!(timeout = ?self.fallback_timeout, "Fallback response source timed out");
                Reply::Conversational(REMOTE_UNAVAILABLE.to_string())
            }
        }
    }

    fn execute(&mut self, key: String, descriptor: CommandDescriptor) -> Reply {
        info!(key = %key, kind = %descriptor.kind, "Executing command");
        let outcome = match descriptor.kind {
            CommandKind::Browser => self.with_parameter(&descriptor, |l, p| l.open_browser(p)),
            CommandKind::Folder => self.with_parameter(&descriptor, |l, p| l.open_folder(p)),
            CommandKind::EyeControl => self.launcher.eye_control(),
            CommandKind::Forecast => self.launcher.forecast(),
            CommandKind::Conversation if self.fallback.is_none() => {
                warn!("Conversation mode requested but no fallback source is configured");
                return Reply::Unavailable;
            }
            CommandKind::Conversation | CommandKind::Exit | CommandKind::Custom => Ok(()),
        };
        if let Err(e) = outcome {
            error!(key = %key, error = %e, "Command action failed");
        }

        self.state = self.state.apply(descriptor.kind);
        Reply::Scripted {
            key,
            kind: descriptor.kind,
            text: descriptor.description,
        }
    }

    fn with_parameter<F>(&self, descriptor: &CommandDescriptor, action: F) -> anyhow::Result<()>
    where
        F: FnOnce(&dyn ActionLauncher, &str) -> anyhow::Result<()>,
    {
        match descriptor.parameter.as_deref() {
            Some(parameter) => action(self.launcher.as_ref(), parameter),
            None => Err(anyhow::anyhow!("{} command has no target", descriptor.kind)),
        }
    }

    pub fn add_command(&mut self, key: &str, description: &str) -> Result<(), RegistryError> {
        self.registry.add(key, description)
    }

    pub fn remove_command(&mut self, key: &str) -> Result<CommandDescriptor, RegistryError> {
        self.registry.remove(key)
    }

    /// `(key, description)` pairs in registry order.
    pub fn commands(&self) -> Vec<(String, String)> {
        self.registry.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::MockResponseSource;
    use crate::registry::MemoryCommandStore;
    use async_trait::async_trait;

    fn registry() -> CommandRegistry {
        CommandRegistry::load(Box::new(MemoryCommandStore::new())).unwrap()
    }

    fn router_with(
        launcher: MockActionLauncher,
        fallback: Option<MockResponseSource>,
    ) -> Router {
        Router::new(
            registry(),
            Arc::new(launcher),
            fallback.map(|f| Arc::new(f) as Arc<dyn ResponseSource>),
        )
    }

    fn silent_fallback() -> MockResponseSource {
        let mut fallback = MockResponseSource::new();
        fallback.expect_respond().never();
        fallback
    }

    #[tokio::test]
    async fn test_browser_command_opens_chrome() {
        let mut launcher = MockActionLauncher::new();
        launcher
            .expect_open_browser()
            .withf(|target| target == "chrome")
            .times(1)
            .returning(|_| Ok(()));
        let mut router = router_with(launcher, Some(silent_fallback()));

        let reply = router.handle("luna n").await;
        assert_eq!(reply.text(), "Abrindo o navegador...");
        assert_eq!(reply.speech(), "Abrindo o navegador...");
        assert!(matches!(reply, Reply::Scripted { kind: CommandKind::Browser, .. }));
        assert_eq!(router.state(), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_unregistered_utterance_while_idle() {
        let mut router = router_with(MockActionLauncher::new(), Some(silent_fallback()));

        let reply = router.handle("xyz").await;
        assert_eq!(reply, Reply::Unrecognized);
        assert_eq!(reply.text(), NOT_RECOGNIZED);
        assert_eq!(reply.speech(), NOT_RECOGNIZED_SPOKEN);
        assert_eq!(router.state(), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_conversation_uses_fallback() {
        let mut fallback = MockResponseSource::new();
        fallback
            .expect_respond()
            .withf(|prompt| prompt == "xyz")
            .times(1)
            .returning(|_| Ok("Olá!".to_string()));
        let mut router = router_with(MockActionLauncher::new(), Some(fallback));

        router.handle("luna oi").await;
        assert_eq!(router.state(), ConversationState::Conversing);

        let reply = router.handle("xyz").await;
        assert_eq!(reply.text(), "Olá!");
        assert_eq!(reply.console_line(), "Luna: Olá!");
    }

    #[tokio::test]
    async fn test_state_machine_transitions() {
        let mut launcher = MockActionLauncher::new();
        launcher.expect_forecast().times(1).returning(|| Ok(()));
        launcher.expect_eye_control().times(1).returning(|| Ok(()));
        let mut router = router_with(launcher, Some(silent_fallback()));

        router.handle("luna oi").await;
        assert_eq!(router.state(), ConversationState::Conversing);

        router.handle("luna hoje").await;
        router.handle("luna olho").await;
        assert_eq!(router.state(), ConversationState::Conversing);

        let reply = router.handle("luna sair").await;
        assert_eq!(reply.text(), "Saindo do modo de controle de olhos...");
        assert_eq!(router.state(), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_fallback_failure_degrades_to_apology() {
        let mut fallback = MockResponseSource::new();
        fallback
            .expect_respond()
            .returning(|_| Err(anyhow::anyhow!("status 500")));
        let mut router = router_with(MockActionLauncher::new(), Some(fallback));

        router.handle("luna oi").await;
        let reply = router.handle("como vai?").await;
        assert_eq!(reply, Reply::Conversational(REMOTE_UNAVAILABLE.to_string()));
        assert_eq!(router.state(), ConversationState::Conversing);
    }

    struct SlowSource;

    #[async_trait]
    impl ResponseSource for SlowSource {
        async fn respond(&self, _prompt: &str) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("tarde demais".to_string())
        }
    }

    #[tokio::test]
    async fn test_fallback_timeout_degrades_to_apology() {
        let mut router = Router::new(
            registry(),
            Arc::new(NoopLauncher),
            Some(Arc::new(SlowSource)),
        )
        .with_fallback_timeout(Duration::from_millis(20));

        router.handle("luna oi").await;
        let reply = router.handle("oi?").await;
        assert_eq!(reply.text(), REMOTE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_conversation_unavailable_without_fallback() {
        let mut router = router_with(MockActionLauncher::new(), None);

        let reply = router.handle("luna oi").await;
        assert_eq!(reply, Reply::Unavailable);
        assert_eq!(reply.text(), CONVERSATION_UNAVAILABLE);
        assert_eq!(router.state(), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_scripted_path_is_deterministic() {
        let mut launcher = MockActionLauncher::new();
        launcher
            .expect_open_browser()
            .withf(|target| target == "https://github.com")
            .times(2)
            .returning(|_| Ok(()));
        let mut router = router_with(launcher, Some(silent_fallback()));

        let first = router.handle("luna kit").await;
        let second = router.handle("  Luna Kit ").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_launcher_failure_still_replies() {
        let mut launcher = MockActionLauncher::new();
        launcher
            .expect_open_folder()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("no such folder")));
        let mut router = router_with(launcher, Some(silent_fallback()));

        let reply = router.handle("luna pasta").await;
        assert_eq!(reply.text(), "Abrindo a pasta padrão...");
    }

    #[tokio::test]
    async fn test_custom_commands_route_after_add() {
        let mut router = router_with(MockActionLauncher::new(), Some(silent_fallback()));
        router.add_command("luna música", "Tocando música...").unwrap();

        let reply = router.handle("luna música").await;
        assert!(matches!(reply, Reply::Scripted { kind: CommandKind::Custom, .. }));
        assert_eq!(reply.text(), "Tocando música...");

        router.remove_command("luna música").unwrap();
        assert_eq!(router.handle("luna música").await, Reply::Unrecognized);
        assert_eq!(router.commands().len(), 7);
    }
}
