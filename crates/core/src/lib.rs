//! Core engine of the Luna assistant.
//!
//! Everything here is I/O-free apart from the command store seam and the
//! remote completion client: the service crate wires real speech, launcher and
//! console adapters around a [`router::Router`].

pub mod command;
pub mod completion;
pub mod conversation;
pub mod dataset;
pub mod error;
pub mod fallback;
pub mod predictor;
pub mod registry;
pub mod router;
pub mod vocabulary;

pub use command::{CommandDescriptor, CommandKind};
pub use conversation::ConversationState;
pub use registry::{CommandRegistry, CommandStore, PersistedTable};
pub use router::{ActionLauncher, Reply, Router};
