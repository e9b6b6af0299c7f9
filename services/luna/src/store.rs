//! File-backed persistence: the JSON command table and the conversation corpus.

use indexmap::IndexMap;
use luna_core::command::CommandDescriptor;
use luna_core::error::StoreError;
use luna_core::registry::{CommandStore, PersistedTable};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Sentences used when no corpus file is present.
pub const DEFAULT_CORPUS: [&str; 9] = [
    "Olá",
    "Oi, como você está?",
    "Estou bem, e você?",
    "Que legal!",
    "O que você gosta de fazer?",
    "Eu sou a Luna, sua assistente.",
    "O que você quer saber?",
    "Como está o tempo?",
    "Me fale sobre você.",
];

/// Either document shape the command file has been written in.
#[derive(Deserialize)]
#[serde(untagged)]
enum CommandFile {
    Current(PersistedTable),
    Legacy(IndexMap<String, CommandDescriptor>),
}

/// Command table stored as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonCommandStore {
    path: PathBuf,
}

impl JsonCommandStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandStore for JsonCommandStore {
    fn load(&self) -> Result<PersistedTable, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No command file yet, using built-ins");
                return Ok(PersistedTable::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<CommandFile>(&raw)? {
            CommandFile::Current(table) => Ok(table),
            CommandFile::Legacy(commands) => {
                debug!(path = %self.path.display(), "Read legacy flat command file");
                Ok(PersistedTable {
                    commands,
                    removed: Vec::new(),
                })
            }
        }
    }

    fn save(&self, table: &PersistedTable) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(table)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), commands = table.commands.len(), "Command file saved");
        Ok(())
    }
}

/// Reads the corpus file as trimmed lines, falling back to [`DEFAULT_CORPUS`]
/// when the file does not exist.
pub fn load_corpus(path: &Path) -> std::io::Result<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(raw.lines().map(|line| line.trim().to_string()).collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Corpus file not found, using the default corpus");
            Ok(DEFAULT_CORPUS.iter().map(|s| s.to_string()).collect())
        }
        Err(e) => Err(e),
    }
}
