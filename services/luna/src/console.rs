//! Console presenter for the assistant's transcript.

use std::io::Write;
use std::sync::Mutex;

/// Where reply and status lines are shown to the user.
pub trait Console: Send + Sync {
    fn append(&self, line: &str);
}

/// Prints each line to standard output.
#[derive(Debug, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn append(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout only loses transcript lines.
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

/// Keeps every appended line in memory.
#[derive(Debug, Default)]
pub struct MemoryConsole {
    lines: Mutex<Vec<String>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Console for MemoryConsole {
    fn append(&self, line: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line.to_string()),
            Err(poisoned) => poisoned.into_inner().push(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_console_keeps_order() {
        let console = MemoryConsole::new();
        console.append("Bem-vindo à Luna!");
        console.append("Luna: Olá!");
        assert_eq!(console.lines(), vec!["Bem-vindo à Luna!", "Luna: Olá!"]);
    }
}
