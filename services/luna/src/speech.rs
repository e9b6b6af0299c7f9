//! Speech input and output adapters.
//!
//! Both directions shell out to an external program configured at startup, so
//! any recogniser or synthesiser with a command-line front end can be plugged
//! in without linking audio libraries.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// How long a single listen attempt may take.
pub const LISTEN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("No speech was detected")]
    NoSpeechDetected,
    #[error("Speech recognition service error: {0}")]
    Service(String),
}

/// Produces one transcribed utterance per call.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    async fn listen(&self) -> Result<String, SpeechError>;
}

/// Speaks text aloud. Best-effort: failures are logged, never surfaced.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str);
}

/// Splits a configured command line into program and arguments.
fn split_command(command_line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command_line.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Runs an external speech-to-text program and reads the utterance from stdout.
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    command_line: String,
    timeout: Duration,
}

impl CommandTranscriber {
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
            timeout: LISTEN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SpeechInput for CommandTranscriber {
    async fn listen(&self) -> Result<String, SpeechError> {
        let (program, args) = split_command(&self.command_line)
            .ok_or_else(|| SpeechError::Service("empty transcriber command".to_string()))?;

        let child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpeechError::Service(format!("{}: {}", program, e)))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| SpeechError::Service(e.to_string()))?,
            Err(_) => {
                debug!(timeout = ?self.timeout, "Listen attempt timed out");
                return Err(SpeechError::NoSpeechDetected);
            }
        };

        if !output.status.success() {
            return Err(SpeechError::Service(format!(
                "{} exited with {}",
                program, output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(SpeechError::NoSpeechDetected);
        }
        Ok(text)
    }
}

/// Runs an external text-to-speech program with the text as its last argument.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    command_line: String,
    voice: Option<String>,
}

impl CommandSpeaker {
    pub fn new(command_line: impl Into<String>, voice: Option<String>) -> Self {
        Self {
            command_line: command_line.into(),
            voice,
        }
    }

    fn arguments(&self, text: &str) -> Option<(String, Vec<String>)> {
        let (program, mut args) = split_command(&self.command_line)?;
        if let Some(voice) = &self.voice {
            args.push("-v".to_string());
            args.push(voice.clone());
        }
        args.push(text.to_string());
        Some((program, args))
    }
}

#[async_trait]
impl SpeechOutput for CommandSpeaker {
    async fn speak(&self, text: &str) {
        let Some((program, args)) = self.arguments(text) else {
            return;
        };
        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(program = %program, %status, "Speech synthesis failed"),
            Err(e) => warn!(program = %program, error = %e, "Could not start speech synthesis"),
        }
    }
}

/// Speech output that stays quiet.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeaker;

#[async_trait]
impl SpeechOutput for SilentSpeaker {
    async fn speak(&self, text: &str) {
        debug!(text = %text, "Speech output disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_arguments_include_voice() {
        let speaker = CommandSpeaker::new("espeak -s 150", Some("pt+f3".to_string()));
        let (program, args) = speaker.arguments("Olá").unwrap();
        assert_eq!(program, "espeak");
        assert_eq!(args, vec!["-s", "150", "-v", "pt+f3", "Olá"]);
    }

    #[test]
    fn test_speaker_without_voice() {
        let speaker = CommandSpeaker::new("say", None);
        let (_, args) = speaker.arguments("Estou escutando.").unwrap();
        assert_eq!(args, vec!["Estou escutando."]);
        assert!(CommandSpeaker::new("  ", None).arguments("x").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transcriber_reads_stdout() {
        let transcriber = CommandTranscriber::new("echo luna oi");
        assert_eq!(transcriber.listen().await.unwrap(), "luna oi");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transcriber_empty_output_is_no_speech() {
        let transcriber = CommandTranscriber::new("true");
        assert_eq!(
            transcriber.listen().await.unwrap_err(),
            SpeechError::NoSpeechDetected
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transcriber_failure_is_service_error() {
        let transcriber = CommandTranscriber::new("false");
        assert!(matches!(
            transcriber.listen().await,
            Err(SpeechError::Service(_))
        ));

        let missing = CommandTranscriber::new("definitely-not-a-real-transcriber");
        assert!(matches!(missing.listen().await, Err(SpeechError::Service(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transcriber_timeout_is_no_speech() {
        let transcriber =
            CommandTranscriber::new("sleep 5").with_timeout(Duration::from_millis(50));
        assert_eq!(
            transcriber.listen().await.unwrap_err(),
            SpeechError::NoSpeechDetected
        );
    }
}
