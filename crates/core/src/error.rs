//! Error types for the command engine and the conversational model.
//!
//! Each concern gets its own enum so callers can decide which failures are
//! user-facing notices and which ones are startup-fatal.

/// Failures from the command-table persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Command table I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Command table is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures from command registry mutations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A user-supplied key or description was rejected.
    #[error("Invalid command: {0}")]
    Validation(String),
    /// `remove` was asked for a key the registry does not hold.
    #[error("Command not found: '{0}'")]
    NotFound(String),
    /// The table changed in memory but could not be written back.
    #[error("Failed to persist command table: {0}")]
    Persistence(#[from] StoreError),
}

/// Corpus problems detected while building the vocabulary or the dataset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorpusError {
    #[error("The conversation corpus has no lines")]
    EmptyCorpus,
    #[error("No corpus line has more than one token; nothing to train on")]
    NoTrainableExamples,
}

/// Failures from the sequence predictor lifecycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictorError {
    #[error("The predictor was queried before it was trained")]
    NotTrained,
    #[error("The predictor has already been trained")]
    AlreadyTrained,
    #[error("Training failed: {0}")]
    Training(String),
}

/// Any fatal failure while preparing the local conversational model at startup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

/// Failures talking to the remote completion service.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Request to the completion service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Completion service answered with status {0}")]
    Status(u16),
    #[error("Completion response had no message content")]
    MalformedResponse,
}
