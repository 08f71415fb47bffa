// crates/strata-daemon/src/state.rs
//
// Node state machine for the Strata daemon.
//
// Valid transitions:
//   Initializing -> Syncing -> Ready -> Syncing
//   Any state -> ShuttingDown

use std::fmt;

use crate::error::DaemonError;

/// Lifecycle states of the daemon node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// Opening the store, applying genesis, validating routes.
    Initializing,
    /// Processing blocks from the feed.
    Syncing,
    /// Caught up with the feed and waiting for more.
    Ready,
    /// Node is shutting down gracefully.
    ShuttingDown,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Initializing => write!(f, "Initializing"),
            NodeState::Syncing => write!(f, "Syncing"),
            NodeState::Ready => write!(f, "Ready"),
            NodeState::ShuttingDown => write!(f, "ShuttingDown"),
        }
    }
}

/// State machine for managing node lifecycle transitions.
pub struct NodeStateMachine {
    pub current: NodeState,
}

impl NodeStateMachine {
    /// Create a new state machine starting in the Initializing state.
    pub fn new() -> Self {
        Self {
            current: NodeState::Initializing,
        }
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns an error if the transition is not valid.
    pub fn transition(&mut self, new_state: NodeState) -> Result<(), DaemonError> {
        let valid = match (&self.current, &new_state) {
            (_, NodeState::ShuttingDown) => true,
            (NodeState::Initializing, NodeState::Syncing) => true,
            (NodeState::Syncing, NodeState::Ready) => true,
            (NodeState::Ready, NodeState::Syncing) => true,
            _ => false,
        };

        if valid {
            tracing::info!("State transition: {} -> {}", self.current, new_state);
            self.current = new_state;
            Ok(())
        } else {
            Err(DaemonError::State(format!("{} -> {}", self.current, new_state)))
        }
    }
}

impl Default for NodeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut sm = NodeStateMachine::new();
        sm.transition(NodeState::Syncing).unwrap();
        sm.transition(NodeState::Ready).unwrap();
        sm.transition(NodeState::Syncing).unwrap();
        sm.transition(NodeState::ShuttingDown).unwrap();
        assert_eq!(sm.current, NodeState::ShuttingDown);
    }

    #[test]
    fn test_cannot_skip_syncing() {
        let mut sm = NodeStateMachine::new();
        assert!(matches!(sm.transition(NodeState::Ready), Err(DaemonError::State(_))));
        assert_eq!(sm.current, NodeState::Initializing);
    }
}
