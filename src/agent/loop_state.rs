//! Turn state tracking
//!
//! One call to `process_query` walks
//! `AwaitingQuery → RequestIssued → ResponseReceived → {ToolCallPending, Complete}`
//! and loops back to `RequestIssued` after every tool cycle.

use crate::llm::ModelReply;

/// Phase of the conversation loop within one turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingQuery,
    RequestIssued,
    /// Transport returned; the reply is being decoded
    ResponseReceived,
    ToolCallPending,
    Complete,
}

/// State of one run of the conversation loop
#[derive(Debug, Clone)]
pub struct TurnState {
    pub phase: TurnPhase,
    /// Requests sent to the model so far
    pub requests: usize,
    /// Tool intents executed so far
    pub tool_calls: usize,
}

impl TurnState {
    /// Create a state waiting for its query
    pub fn new() -> Self {
        Self {
            phase: TurnPhase::AwaitingQuery,
            requests: 0,
            tool_calls: 0,
        }
    }

    /// Check if the loop should issue another request
    pub fn should_continue(&self) -> bool {
        self.phase != TurnPhase::Complete
    }

    /// A request is on its way to the model
    pub fn issue(&mut self) {
        self.phase = TurnPhase::RequestIssued;
        self.requests += 1;
    }

    /// Transport returned a body
    pub fn respond(&mut self) {
        self.phase = TurnPhase::ResponseReceived;
    }

    /// The decoded reply decides where the turn goes next
    pub fn receive(&mut self, reply: &ModelReply) -> TurnPhase {
        self.phase = if reply.wants_tools() {
            self.tool_calls += reply.tool_calls.len();
            TurnPhase::ToolCallPending
        } else {
            TurnPhase::Complete
        };
        self.phase
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolCallRequest;

    #[test]
    fn test_turn_state_new() {
        let state = TurnState::new();
        assert_eq!(state.phase, TurnPhase::AwaitingQuery);
        assert_eq!(state.requests, 0);
        assert!(state.should_continue());
    }

    #[test]
    fn test_tool_cycle_then_complete() {
        let mut state = TurnState::new();

        state.issue();
        state.respond();
        assert_eq!(state.phase, TurnPhase::ResponseReceived);
        let reply = ModelReply {
            tool_calls: vec![
                ToolCallRequest::new("1", "a", serde_json::json!({})),
                ToolCallRequest::new("2", "b", serde_json::json!({})),
            ],
            ..Default::default()
        };
        assert_eq!(state.receive(&reply), TurnPhase::ToolCallPending);
        assert!(state.should_continue());

        state.issue();
        assert_eq!(state.receive(&ModelReply::text("done")), TurnPhase::Complete);
        assert!(!state.should_continue());
        assert_eq!(state.requests, 2);
        assert_eq!(state.tool_calls, 2);
    }
}
