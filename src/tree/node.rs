use generational_arena::Index;
use std::fmt;

use crate::domain::{AccountId, ContainerId, SidebarItemId};

/// Handle to a node in a [`NodeStore`](super::NodeStore).
///
/// Handles are generational: once a node is released its handle never
/// resolves again, even if the slot is reused for a new node. Two handles are
/// equal exactly when they name the same node instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", slot, generation)
    }
}

/// The domain object a node stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Represented {
    /// Synthetic top of the tree. Only the root may represent this.
    Root,
    /// The "Smart Feeds" section.
    SmartFeeds,
    /// An account, shown as the "Feeds" section.
    Account(AccountId),
    /// A feed, folder or smart feed.
    Item(SidebarItemId),
}

impl Represented {
    /// The container whose feeds and folders become this node's children.
    pub fn container(&self) -> Option<ContainerId> {
        match self {
            Self::Account(id) => Some(ContainerId::Account(id.clone())),
            Self::Item(item) => item.as_container(),
            Self::Root | Self::SmartFeeds => None,
        }
    }

    pub fn item_id(&self) -> Option<&SidebarItemId> {
        match self {
            Self::Item(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Item(id) if id.is_folder())
    }
}

impl From<SidebarItemId> for Represented {
    fn from(id: SidebarItemId) -> Self {
        Self::Item(id)
    }
}

impl fmt::Display for Represented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::SmartFeeds => f.write_str("smartFeeds"),
            Self::Account(id) => write!(f, "account:{}", id),
            Self::Item(id) => id.fmt(f),
        }
    }
}

/// One row of the presentation tree.
#[derive(Debug)]
pub struct Node {
    pub(crate) represented: Represented,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) can_have_child_nodes: bool,
    pub(crate) is_group_item: bool,
}

impl Node {
    pub(crate) fn new(represented: Represented, parent: Option<NodeId>) -> Self {
        Self {
            represented,
            parent,
            children: Vec::new(),
            can_have_child_nodes: false,
            is_group_item: false,
        }
    }

    pub fn represented(&self) -> &Represented {
        &self.represented
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children as of the most recent reconciliation of this node.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether this node is a container that may be expanded.
    pub fn can_have_child_nodes(&self) -> bool {
        self.can_have_child_nodes
    }

    /// Whether this node is a non-selectable section header.
    pub fn is_group_item(&self) -> bool {
        self.is_group_item
    }
}
