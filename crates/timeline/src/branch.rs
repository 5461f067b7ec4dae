//! Sibling navigation for branching conversations.
//!
//! A prompt can have several alternate assistant responses. Given the
//! current node and the ordered sibling list from the conversation store,
//! work out where we are and which sibling is previous/next. Nothing here
//! errors: missing or inconsistent input just means no navigation.

use packetline_protocol::MessageId;

#[derive(Debug, Clone, Copy)]
pub struct SiblingNavigator<'a> {
    node_id: MessageId,
    sibling_ids: Option<&'a [MessageId]>,
    current_index: Option<usize>,
}

impl<'a> SiblingNavigator<'a> {
    pub fn new(node_id: MessageId, sibling_ids: Option<&'a [MessageId]>) -> Self {
        let current_index =
            sibling_ids.and_then(|ids| ids.iter().position(|id| *id == node_id));
        Self {
            node_id,
            sibling_ids,
            current_index,
        }
    }

    pub fn node_id(&self) -> MessageId {
        self.node_id
    }

    /// Position of the node among its siblings; `None` when absent or unknown
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Number of siblings, counting the node itself
    pub fn len(&self) -> usize {
        self.sibling_ids.map_or(0, <[MessageId]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether switch controls should be shown at all. A node with a single
    /// sibling, or a caller without a selection handler, gets none.
    pub fn switcher_visible(&self, has_selection_handler: bool) -> bool {
        self.current_index.is_some() && has_selection_handler && self.len() > 1
    }

    pub fn previous(&self) -> Option<MessageId> {
        let index = self.current_index?.checked_sub(1)?;
        self.sibling_ids?.get(index).copied()
    }

    pub fn next(&self) -> Option<MessageId> {
        let index = self.current_index? + 1;
        self.sibling_ids?.get(index).copied()
    }
}
