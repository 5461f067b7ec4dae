//! Core types shared across the protocol

use serde::{Deserialize, Serialize};

/// Identifier of one stored chat message
pub type MessageId = i64;

/// Where a packet belongs inside the assistant turn.
///
/// `(turn_index, tab_index)` identifies one unit of work (a tool call, a
/// research agent, a span of text). Packets emitted by a research agent's
/// own sub-conversation also carry `sub_turn_index`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub turn_index: u32,
    #[serde(default)]
    pub tab_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_turn_index: Option<u32>,
}

impl Placement {
    pub fn new(turn_index: u32, tab_index: u32) -> Self {
        Self {
            turn_index,
            tab_index,
            sub_turn_index: None,
        }
    }

    /// Same placement, inside the research-agent sub-conversation `sub_turn_index`
    pub fn with_sub_turn(self, sub_turn_index: u32) -> Self {
        Self {
            sub_turn_index: Some(sub_turn_index),
            ..self
        }
    }

    /// Unit identity, ignoring the sub-conversation coordinate
    pub fn unit_key(&self) -> (u32, u32) {
        (self.turn_index, self.tab_index)
    }
}

/// A retrieved document as streamed by search and fetch tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDoc {
    pub document_id: String,
    pub semantic_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub blurb: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
}

/// An image produced by the image generation tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub file_id: String,
    pub url: String,
    pub revised_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

/// Message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    System,
    User,
    Assistant,
}

/// One node of the stored conversation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDetail {
    pub message_id: MessageId,
    #[serde(default)]
    pub parent_message: Option<MessageId>,
    #[serde(default)]
    pub latest_child_message: Option<MessageId>,
    pub message_type: MessageType,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
