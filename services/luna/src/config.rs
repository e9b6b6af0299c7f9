use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which response source answers unmatched utterances in conversation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackSource {
    Remote,
    Local,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub commands_path: PathBuf,
    pub corpus_path: PathBuf,
    pub fallback_source: FallbackSource,
    pub completion_api_url: String,
    pub completion_api_key: Option<SecretString>,
    pub completion_api_host: Option<String>,
    pub chat_model: String,
    pub completion_max_tokens: u32,
    pub completion_temperature: f32,
    pub completion_timeout: Duration,
    pub training_epochs: usize,
    pub tokenizer_fold_case: bool,
    pub listen_retry: Duration,
    pub transcriber_cmd: Option<String>,
    pub tts_cmd: Option<String>,
    pub tts_voice: Option<String>,
    pub log_level: Level,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Reads a non-empty optional variable.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = var_or(name, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("'{}': {}", raw, e)))
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// A missing `COMPLETION_API_KEY` is not an error here: startup falls
    /// back to the local predictor when the remote client cannot be built.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let commands_path = PathBuf::from(var_or("LUNA_COMMANDS_PATH", "comandos.json"));
        let corpus_path = PathBuf::from(var_or("LUNA_CORPUS_PATH", "dataset_conversa.txt"));

        let source_str = var_or("FALLBACK_SOURCE", "remote");
        let fallback_source = match source_str.to_lowercase().as_str() {
            "remote" => FallbackSource::Remote,
            "local" => FallbackSource::Local,
            other => {
                return Err(ConfigError::InvalidValue(
                    "FALLBACK_SOURCE".to_string(),
                    format!("'{}' is neither 'remote' nor 'local'", other),
                ));
            }
        };

        let completion_api_url = var_or(
            "COMPLETION_API_URL",
            luna_core::completion::DEFAULT_COMPLETION_URL,
        );
        let completion_api_key = optional_var("COMPLETION_API_KEY").map(SecretString::from);
        let completion_api_host = optional_var("COMPLETION_API_HOST");
        let chat_model = var_or("CHAT_MODEL", "gpt-4o");
        let completion_max_tokens = parse_var::<u32>("COMPLETION_MAX_TOKENS", "100")?;
        let completion_temperature = parse_var::<f32>("COMPLETION_TEMPERATURE", "0.9")?;
        let completion_timeout =
            Duration::from_secs(parse_var::<u64>("COMPLETION_TIMEOUT_SECS", "30")?);

        let training_epochs = parse_var::<usize>("TRAINING_EPOCHS", "100")?;
        let tokenizer_fold_case = parse_var::<bool>("TOKENIZER_FOLD_CASE", "false")?;
        let listen_retry = Duration::from_millis(parse_var::<u64>("LISTEN_RETRY_MS", "1000")?);

        let transcriber_cmd = optional_var("LUNA_TRANSCRIBER_CMD");
        let tts_cmd = optional_var("LUNA_TTS_CMD");
        let tts_voice = optional_var("LUNA_TTS_VOICE");

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            commands_path,
            corpus_path,
            fallback_source,
            completion_api_url,
            completion_api_key,
            completion_api_host,
            chat_model,
            completion_max_tokens,
            completion_temperature,
            completion_timeout,
            training_epochs,
            tokenizer_fold_case,
            listen_retry,
            transcriber_cmd,
            tts_cmd,
            tts_voice,
            log_level,
        })
    }
}
