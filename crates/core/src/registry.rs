//! Command Registry
//!
//! Exact-match table from normalized utterance to [`CommandDescriptor`]. The
//! table starts from the built-ins, layers the persisted user entries on top,
//! and writes itself back through a [`CommandStore`] after every mutation.

use crate::command::{CommandDescriptor, builtin_commands, normalize_utterance};
use crate::error::{RegistryError, StoreError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{info, warn};

/// The on-disk shape of the command table.
///
/// `commands` is the full merged table in list order. `removed` holds built-in
/// keys the user deleted so they stay deleted after a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedTable {
    #[serde(rename = "comandos")]
    pub commands: IndexMap<String, CommandDescriptor>,
    #[serde(rename = "removidos", default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
}

/// Persistence collaborator for the command table.
pub trait CommandStore: Send + Sync {
    /// Loads the persisted table; an absent table is an empty one.
    fn load(&self) -> Result<PersistedTable, StoreError>;
    /// Replaces the persisted table in full.
    fn save(&self, table: &PersistedTable) -> Result<(), StoreError>;
}

/// A `CommandStore` that keeps the table in memory.
#[derive(Debug, Default)]
pub struct MemoryCommandStore {
    table: Mutex<PersistedTable>,
}

impl MemoryCommandStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: PersistedTable) -> Self {
        Self {
            table: Mutex::new(table),
        }
    }

    /// A copy of whatever was saved last.
    pub fn table(&self) -> PersistedTable {
        match self.table.lock() {
            Ok(table) => table.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CommandStore for MemoryCommandStore {
    fn load(&self) -> Result<PersistedTable, StoreError> {
        Ok(self.table())
    }

    fn save(&self, table: &PersistedTable) -> Result<(), StoreError> {
        match self.table.lock() {
            Ok(mut guard) => *guard = table.clone(),
            Err(poisoned) => *poisoned.into_inner() = table.clone(),
        }
        Ok(())
    }
}

pub struct CommandRegistry {
    commands: IndexMap<String, CommandDescriptor>,
    removed: Vec<String>,
    store: Box<dyn CommandStore>,
}

impl CommandRegistry {
    /// Builds the merged table: built-ins in declaration order, minus removed
    /// built-ins, then persisted entries in file order. A persisted entry for an
    /// existing key overwrites it in place; new keys are appended.
    pub fn load(store: Box<dyn CommandStore>) -> Result<Self, StoreError> {
        let persisted = store.load()?;
        let builtins: IndexMap<String, CommandDescriptor> =
            builtin_commands().into_iter().collect();

        let mut commands = builtins.clone();
        let mut removed = Vec::new();
        for key in persisted.removed {
            let key = normalize_utterance(&key);
            if builtins.contains_key(&key) && !removed.contains(&key) {
                commands.shift_remove(&key);
                removed.push(key);
            }
        }

        for (key, descriptor) in persisted.commands {
            let key = normalize_utterance(&key);
            if key.is_empty() || descriptor.description.trim().is_empty() {
                warn!(key = %key, "Skipping persisted command with empty key or description");
                continue;
            }
            if removed.contains(&key) {
                continue;
            }
            commands.insert(key, descriptor);
        }

        info!(commands = commands.len(), removed = removed.len(), "Command table loaded");
        Ok(Self {
            commands,
            removed,
            store,
        })
    }

    /// Exact match against the merged table.
    pub fn lookup(&self, text: &str) -> Option<&CommandDescriptor> {
        self.commands.get(&normalize_utterance(text))
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lookup(text).is_some()
    }

    /// Registers (or overwrites) a `Custom` command and persists the table.
    pub fn add(&mut self, key: &str, description: &str) -> Result<(), RegistryError> {
        let key = normalize_utterance(key);
        let description = description.trim();
        if key.is_empty() {
            return Err(RegistryError::Validation(
                "command key must not be empty".to_string(),
            ));
        }
        if description.is_empty() {
            return Err(RegistryError::Validation(
                "command description must not be empty".to_string(),
            ));
        }

        let backup = (self.commands.clone(), self.removed.clone());
        self.removed.retain(|k| k != &key);
        self.commands
            .insert(key.clone(), CommandDescriptor::custom(description));

        if let Err(e) = self.persist() {
            (self.commands, self.removed) = backup;
            return Err(e.into());
        }
        info!(key = %key, "Command added");
        Ok(())
    }

    /// Deletes `key` and persists the table. Returns the removed descriptor.
    pub fn remove(&mut self, key: &str) -> Result<CommandDescriptor, RegistryError> {
        let key = normalize_utterance(key);
        if !self.commands.contains_key(&key) {
            return Err(RegistryError::NotFound(key));
        }

        let backup = (self.commands.clone(), self.removed.clone());
        let descriptor = self
            .commands
            .shift_remove(&key)
            .ok_or_else(|| RegistryError::NotFound(key.clone()))?;
        let is_builtin = builtin_commands().iter().any(|(k, _)| k == &key);
        if is_builtin && !self.removed.contains(&key) {
            self.removed.push(key.clone());
        }

        if let Err(e) = self.persist() {
            (self.commands, self.removed) = backup;
            return Err(e.into());
        }
        info!(key = %key, "Command removed");
        Ok(descriptor)
    }

    /// `(key, description)` pairs in table order.
    pub fn list(&self) -> Vec<(String, String)> {
        self.commands
            .iter()
            .map(|(k, d)| (k.clone(), d.description.clone()))
            .collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = (&str, &CommandDescriptor)> {
        self.commands.iter().map(|(k, d)| (k.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The table as it would be written to the store.
    pub fn snapshot(&self) -> PersistedTable {
        PersistedTable {
            commands: self.commands.clone(),
            removed: self.removed.clone(),
        }
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.store.save(&self.snapshot())
    }
}
