//! Packetline Timeline
//!
//! Turns the packet stream of one assistant turn into grouped timeline
//! steps, and navigates between alternate responses in a branching
//! conversation.

pub mod aggregator;
pub mod branch;
pub mod classify;
pub mod transition;
pub mod tree;

pub use aggregator::TimelineAggregator;
pub use branch::SiblingNavigator;
pub use classify::{is_research_agent_group, supports_compact, StepKind};
pub use transition::{StepError, StreamEnd, Timeline, TimelineEvent, TimelineStep};
pub use tree::MessageTree;

use packetline_protocol::MessageId;
use thiserror::Error;

/// Errors raised while building or updating a message tree
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Duplicate message id {0}")]
    DuplicateMessage(MessageId),

    #[error("Message {message_id} points at unknown parent {parent}")]
    UnknownParent {
        message_id: MessageId,
        parent: MessageId,
    },

    #[error("Unknown message {0}")]
    UnknownMessage(MessageId),
}
