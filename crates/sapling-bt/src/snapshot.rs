#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::node::NodeId;
use crate::status::{Status, SubStatus};

/// Point-in-time view of a subtree, for inspectors and history recorders.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: String,
    pub kind: String,
    pub status: Status,
    pub sub_status: SubStatus,
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Depth-first search by node id.
    pub fn find(&self, id: NodeId) -> Option<&NodeSnapshot> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// First node (depth-first) with the given name.
    pub fn find_named(&self, name: &str) -> Option<&NodeSnapshot> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_named(name))
    }

    /// Number of nodes in the subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeSnapshot::node_count).sum::<usize>()
    }
}
