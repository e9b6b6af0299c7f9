//! Luna Assistant Library Crate
//!
//! The runtime shell around `luna-core`: environment configuration, the JSON
//! command store, speech and launcher adapters, the shared session, the voice
//! listening loop and the interactive text shell. The `luna` binary is a thin
//! wrapper around this library.

pub mod config;
pub mod console;
pub mod launcher;
pub mod listener;
pub mod shell;
pub mod speech;
pub mod startup;
pub mod state;
pub mod store;
