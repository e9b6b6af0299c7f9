//! Conversation mode state machine.

use crate::command::CommandKind;

/// Whether unmatched utterances go to the fallback response source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Idle,
    Conversing,
}

impl ConversationState {
    /// State after executing a command of `kind`.
    ///
    /// Only `Conversation` enters and only `Exit` leaves; everything else keeps
    /// the current state.
    pub fn apply(self, kind: CommandKind) -> Self {
        match kind {
            CommandKind::Conversation => ConversationState::Conversing,
            CommandKind::Exit => ConversationState::Idle,
            _ => self,
        }
    }

    pub fn is_conversing(self) -> bool {
        self == ConversationState::Conversing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [CommandKind; 7] = [
        CommandKind::Browser,
        CommandKind::Folder,
        CommandKind::EyeControl,
        CommandKind::Exit,
        CommandKind::Forecast,
        CommandKind::Conversation,
        CommandKind::Custom,
    ];

    #[test]
    fn test_initial_state_is_idle() {
        assert_eq!(ConversationState::default(), ConversationState::Idle);
    }

    #[test]
    fn test_enter_and_leave() {
        let state = ConversationState::Idle.apply(CommandKind::Conversation);
        assert!(state.is_conversing());
        assert_eq!(state.apply(CommandKind::Exit), ConversationState::Idle);
    }

    #[test]
    fn test_other_kinds_keep_state() {
        for state in [ConversationState::Idle, ConversationState::Conversing] {
            for kind in ALL_KINDS {
                if matches!(kind, CommandKind::Conversation | CommandKind::Exit) {
                    continue;
                }
                assert_eq!(state.apply(kind), state, "{} changed {:?}", kind, state);
            }
        }
    }

    #[test]
    fn test_transitions_are_idempotent() {
        let conversing = ConversationState::Conversing;
        assert_eq!(conversing.apply(CommandKind::Conversation), conversing);
        let idle = ConversationState::Idle;
        assert_eq!(idle.apply(CommandKind::Exit), idle);
    }
}
