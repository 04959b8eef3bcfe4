//! Presentation tree: node storage, the reconciling controller, and the
//! child rules for the sidebar and the folder picker.
//!
//! A [`TreeController`] owns a [`NodeStore`] and asks its [`TreeDelegate`]
//! for each node's children. Delegates reuse existing nodes for unchanged
//! items, so a node's [`NodeId`] stays the same across reconciliations as
//! long as the item it represents stays visible under the same parent.
//!
//! ```
//! use feedtree::domain::{Account, Feed, Snapshot};
//! use feedtree::tree::{Represented, SidebarTree};
//! use feedtree::domain::AccountId;
//!
//! let snapshot = Snapshot {
//!     smart_feeds: Vec::new(),
//!     accounts: vec![Account {
//!         id: "local".into(),
//!         name: "On My Device".into(),
//!         active: true,
//!         feeds: vec![Feed { id: "1".into(), name: "Rust Blog".into(), unread_count: 0 }],
//!         folders: Vec::new(),
//!     }],
//! };
//!
//! let mut tree = SidebarTree::with_source(snapshot).unwrap();
//! let feeds = tree
//!     .node_representing(&Represented::Account(AccountId::new("local")))
//!     .unwrap();
//! assert_eq!(tree.children(feeds).unwrap().unwrap().len(), 1);
//!
//! tree.set_read_filtered(true);
//! assert!(tree.children(feeds).unwrap().unwrap().is_empty());
//! ```

mod controller;
mod folder;
mod node;
mod sidebar;
mod sort;
mod store;

use thiserror::Error;

pub use controller::{TreeController, TreeDelegate};
pub use folder::{FolderTree, FolderTreeDelegate};
pub use node::{Node, NodeId, Represented};
pub use sidebar::{SidebarDelegate, SidebarTree};
pub use store::NodeStore;

/// Contract violations. Both indicate a caller holding onto a node the tree
/// no longer owns, or a corrupted store; neither is recoverable by retrying.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The handle was released by an earlier reconciliation or never existed.
    #[error("Node {0} is not in the tree")]
    UnknownNode(NodeId),

    #[error("Invalid tree state: {0}")]
    InvalidState(String),
}
