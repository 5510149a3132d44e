//! Agent module - the conversation loop and its history
//!
//! Contains the model that drives tool-calling turns and the session that
//! binds it to a tool host.

pub mod conversation;
pub mod loop_state;
pub mod model;
pub mod session;
pub mod tokens;

pub use conversation::Conversation;
pub use loop_state::{TurnPhase, TurnState};
pub use model::ChatModel;
pub use session::Session;
pub use tokens::{HeuristicEstimator, TokenEstimator};
