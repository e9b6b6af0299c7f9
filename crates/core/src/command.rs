//! Command descriptors and the built-in command table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of actions a command can trigger.
///
/// Serialized with the tags used by the persisted command file; an unknown tag
/// fails to parse instead of being silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    #[serde(rename = "navegador")]
    Browser,
    #[serde(rename = "pasta")]
    Folder,
    #[serde(rename = "olhos")]
    EyeControl,
    #[serde(rename = "sair")]
    Exit,
    #[serde(rename = "previsao")]
    Forecast,
    #[serde(rename = "conversa")]
    Conversation,
    #[serde(rename = "personalizado")]
    Custom,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Browser => "browser",
            CommandKind::Folder => "folder",
            CommandKind::EyeControl => "eye-control",
            CommandKind::Exit => "exit",
            CommandKind::Forecast => "forecast",
            CommandKind::Conversation => "conversation",
            CommandKind::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

/// One registry entry: what to do and what to say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "tipo")]
    pub kind: CommandKind,
    /// URL, program or folder for `Browser`/`Folder` commands.
    #[serde(rename = "caminho", default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl CommandDescriptor {
    pub fn new(kind: CommandKind, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            kind,
            parameter: None,
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    /// A user-defined command that only announces its description.
    pub fn custom(description: impl Into<String>) -> Self {
        Self::new(CommandKind::Custom, description)
    }
}

/// Trims and lowercases raw input into the form registry keys are stored in.
pub fn normalize_utterance(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Folder opened by `luna pasta`: the user's desktop when it can be found.
fn default_folder() -> String {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    std::path::Path::new(&home)
        .join("Desktop")
        .to_string_lossy()
        .into_owned()
}

/// Built-in commands in their fixed declaration order.
pub fn builtin_commands() -> Vec<(String, CommandDescriptor)> {
    vec![
        (
            "luna n".to_string(),
            CommandDescriptor::new(CommandKind::Browser, "Abrindo o navegador...")
                .with_parameter("chrome"),
        ),
        (
            "luna kit".to_string(),
            CommandDescriptor::new(CommandKind::Browser, "Abrindo o site do GitHub...")
                .with_parameter("https://github.com"),
        ),
        (
            "luna pasta".to_string(),
            CommandDescriptor::new(CommandKind::Folder, "Abrindo a pasta padrão...")
                .with_parameter(default_folder()),
        ),
        (
            "luna olho".to_string(),
            CommandDescriptor::new(
                CommandKind::EyeControl,
                "Ativando o controle de mouse pelos olhos...",
            ),
        ),
        (
            "luna sair".to_string(),
            CommandDescriptor::new(CommandKind::Exit, "Saindo do modo de controle de olhos..."),
        ),
        (
            "luna hoje".to_string(),
            CommandDescriptor::new(CommandKind::Forecast, "Falando a previsão do tempo..."),
        ),
        (
            "luna oi".to_string(),
            CommandDescriptor::new(CommandKind::Conversation, "Entrando no modo de conversa..."),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_serializes_with_file_field_names() {
        let descriptor = CommandDescriptor::new(CommandKind::Browser, "Abrindo o navegador...")
            .with_parameter("chrome");
        let json = serde_json::to_string(&descriptor).unwrap();

        assert_eq!(
            json,
            r#"{"descricao":"Abrindo o navegador...","tipo":"navegador","caminho":"chrome"}"#
        );
    }

    #[test]
    fn test_descriptor_without_parameter_omits_path() {
        let json = serde_json::to_string(&CommandDescriptor::custom("Olá")).unwrap();
        assert_eq!(json, r#"{"descricao":"Olá","tipo":"personalizado"}"#);

        let parsed: CommandDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.parameter, None);
        assert_eq!(parsed.kind, CommandKind::Custom);
    }

    #[test]
    fn test_unknown_kind_is_a_parse_error() {
        let json = r#"{"descricao":"x","tipo":"teletransporte"}"#;
        let result: Result<CommandDescriptor, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_builtins_are_complete_and_described() {
        let builtins = builtin_commands();
        let keys: Vec<&str> = builtins.iter().map(|(k, _)| k.as_str()).collect();

        assert_eq!(
            keys,
            vec![
                "luna n",
                "luna kit",
                "luna pasta",
                "luna olho",
                "luna sair",
                "luna hoje",
                "luna oi"
            ]
        );
        for (key, descriptor) in &builtins {
            assert!(!descriptor.description.is_empty(), "{} has no description", key);
            assert_eq!(key, &normalize_utterance(key));
        }
    }

    #[test]
    fn test_normalize_utterance() {
        assert_eq!(normalize_utterance("  Luna N \n"), "luna n");
        assert_eq!(normalize_utterance(""), "");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(CommandKind::EyeControl.to_string(), "eye-control");
        assert_eq!(CommandKind::Custom.to_string(), "custom");
    }
}
