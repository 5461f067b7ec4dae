//! Conversation tree built from flat message records.
//!
//! Children of a parent, ordered by message id, are the sibling list the
//! navigator works over. `latest_child_message` on a parent marks which
//! sibling is active.

use std::collections::HashMap;

use packetline_protocol::{MessageDetail, MessageId};

use crate::branch::SiblingNavigator;
use crate::TreeError;

#[derive(Debug, Clone, Default)]
pub struct MessageTree {
    nodes: HashMap<MessageId, MessageDetail>,
    /// `None` key holds the roots
    children: HashMap<Option<MessageId>, Vec<MessageId>>,
}

impl MessageTree {
    pub fn from_messages(
        messages: impl IntoIterator<Item = MessageDetail>,
    ) -> Result<Self, TreeError> {
        let mut nodes = HashMap::new();
        for message in messages {
            let id = message.message_id;
            if nodes.insert(id, message).is_some() {
                return Err(TreeError::DuplicateMessage(id));
            }
        }

        let mut children: HashMap<Option<MessageId>, Vec<MessageId>> = HashMap::new();
        for message in nodes.values() {
            if let Some(parent) = message.parent_message {
                if !nodes.contains_key(&parent) {
                    return Err(TreeError::UnknownParent {
                        message_id: message.message_id,
                        parent,
                    });
                }
            }
            children
                .entry(message.parent_message)
                .or_default()
                .push(message.message_id);
        }
        for ids in children.values_mut() {
            ids.sort_unstable();
        }

        Ok(Self { nodes, children })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&MessageDetail> {
        self.nodes.get(&id)
    }

    /// All responses to the same parent as `id`, in generation order
    pub fn siblings(&self, id: MessageId) -> Option<&[MessageId]> {
        let node = self.nodes.get(&id)?;
        self.children.get(&node.parent_message).map(Vec::as_slice)
    }

    pub fn navigator(&self, id: MessageId) -> SiblingNavigator<'_> {
        SiblingNavigator::new(id, self.siblings(id))
    }

    /// The branch currently shown: from the newest root, follow each
    /// node's latest child (newest child when unset or stale).
    pub fn active_path(&self) -> Vec<MessageId> {
        let mut path = Vec::new();
        let mut current = self.children.get(&None).and_then(|roots| roots.last().copied());

        while let Some(id) = current {
            path.push(id);
            current = self.active_child(id);
        }
        path
    }

    fn active_child(&self, id: MessageId) -> Option<MessageId> {
        let children = self.children.get(&Some(id))?;
        let latest = self.nodes.get(&id)?.latest_child_message;
        match latest {
            Some(child) if children.contains(&child) => Some(child),
            _ => children.last().copied(),
        }
    }

    /// Make `id` the active response of its parent. Returns the new active path.
    pub fn select(&mut self, id: MessageId) -> Result<Vec<MessageId>, TreeError> {
        let parent = self
            .nodes
            .get(&id)
            .ok_or(TreeError::UnknownMessage(id))?
            .parent_message;

        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.latest_child_message = Some(id);
        }
        Ok(self.active_path())
    }
}
