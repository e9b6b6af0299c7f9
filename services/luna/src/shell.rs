//! Interactive text shell.
//!
//! Lines starting with `:` manage the assistant; anything else is an utterance.

use crate::state::Session;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

pub const HELP: &str = "Comandos do terminal:
  :add <comando> = <descrição>  adiciona um comando
  :remove <comando>             remove um comando
  :list                         lista os comandos
  :listen                       começa a escutar
  :stop                         para de escutar
  :help                         mostra esta ajuda
  :quit                         sai da Luna";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add { key: String, description: String },
    Remove(String),
    List,
    Listen,
    Stop,
    Help,
    Quit,
    Utterance(String),
    /// A `:` line that is not one of the above.
    Unknown(String),
    Empty,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Empty;
        }
        let Some(meta) = line.strip_prefix(':') else {
            return ShellCommand::Utterance(line.to_string());
        };

        let (name, rest) = match meta.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (meta, ""),
        };
        match name {
            "add" => {
                let (key, description) = rest.split_once('=').unwrap_or((rest, ""));
                ShellCommand::Add {
                    key: key.trim().to_string(),
                    description: description.trim().to_string(),
                }
            }
            "remove" => ShellCommand::Remove(rest.to_string()),
            "list" => ShellCommand::List,
            "listen" => ShellCommand::Listen,
            "stop" => ShellCommand::Stop,
            "help" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            _ => ShellCommand::Unknown(line.to_string()),
        }
    }
}

/// Applies one shell command. Returns `false` when the shell should exit.
pub async fn dispatch(session: &Arc<Session>, command: ShellCommand) -> bool {
    match command {
        ShellCommand::Add { key, description } => session.add_command(&key, &description).await,
        ShellCommand::Remove(key) => session.remove_command(&key).await,
        ShellCommand::List => session.list_commands().await,
        ShellCommand::Listen => session.start_listening().await,
        ShellCommand::Stop => session.stop_listening().await,
        ShellCommand::Help => session.console().append(HELP),
        ShellCommand::Quit => return false,
        ShellCommand::Utterance(text) => {
            session.handle(&text).await;
        }
        ShellCommand::Unknown(line) => {
            session
                .console()
                .append(&format!("Comando do terminal desconhecido: {}", line));
        }
        ShellCommand::Empty => {}
    }
    true
}

/// Reads lines from `input` until end of input, `:quit`, or Ctrl-C.
pub async fn run<R>(session: Arc<Session>, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        if !dispatch(&session, ShellCommand::parse(&line)).await {
            break;
        }
    }
    if session.is_listening() {
        session.stop_listening().await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryConsole;
    use crate::speech::SilentSpeaker;
    use luna_core::registry::{CommandRegistry, MemoryCommandStore};
    use luna_core::router::{NoopLauncher, Router};
    use std::time::Duration;

    #[test]
    fn test_parse_meta_commands() {
        assert_eq!(
            ShellCommand::parse(":add Luna Café = Hora do café!"),
            ShellCommand::Add {
                key: "Luna Café".to_string(),
                description: "Hora do café!".to_string()
            }
        );
        assert_eq!(
            ShellCommand::parse(":remove luna kit"),
            ShellCommand::Remove("luna kit".to_string())
        );
        assert_eq!(ShellCommand::parse(" :list "), ShellCommand::List);
        assert_eq!(ShellCommand::parse(":listen"), ShellCommand::Listen);
        assert_eq!(ShellCommand::parse(":stop"), ShellCommand::Stop);
        assert_eq!(ShellCommand::parse(":quit"), ShellCommand::Quit);
        assert_eq!(
            ShellCommand::parse(":dance"),
            ShellCommand::Unknown(":dance".to_string())
        );
    }

    #[test]
    fn test_parse_utterances() {
        assert_eq!(
            ShellCommand::parse("  Luna N  "),
            ShellCommand::Utterance("Luna N".to_string())
        );
        assert_eq!(ShellCommand::parse("   "), ShellCommand::Empty);
    }

    #[test]
    fn test_add_without_description() {
        assert_eq!(
            ShellCommand::parse(":add luna x"),
            ShellCommand::Add {
                key: "luna x".to_string(),
                description: String::new()
            }
        );
    }

    #[tokio::test]
    async fn test_run_processes_script_until_quit() {
        let registry = CommandRegistry::load(Box::new(MemoryCommandStore::new())).unwrap();
        let router = Router::new(registry, Arc::new(NoopLauncher), None);
        let console = Arc::new(MemoryConsole::new());
        let session = Arc::new(Session::new(
            router,
            Arc::new(SilentSpeaker),
            console.clone(),
            None,
            Duration::from_millis(1),
        ));

        let script = ":add luna café = Hora do café!\nluna café\n:quit\nluna kit\n";
        run(session, script.as_bytes()).await.unwrap();

        assert_eq!(
            console.lines(),
            vec!["Comando 'luna café' adicionado com sucesso.", "Hora do café!"]
        );
    }
}
