use super::node::{NodeId, Represented};
use super::store::NodeStore;
use super::TreeError;
use crate::domain::SidebarItemId;

/// Decides what a node's children are.
///
/// Implementations materialize children through the store
/// (`existing_or_new_child`) so unchanged items keep their node, and return
/// them in display order. `Ok(None)` means the node is a leaf.
pub trait TreeDelegate {
    fn child_nodes(
        &mut self,
        store: &mut NodeStore,
        node: NodeId,
    ) -> Result<Option<Vec<NodeId>>, TreeError>;
}

/// Owns a [`NodeStore`] and keeps it in step with a [`TreeDelegate`].
#[derive(Debug)]
pub struct TreeController<D> {
    store: NodeStore,
    delegate: D,
}

impl<D: TreeDelegate> TreeController<D> {
    /// Create a controller with a fresh root and build the whole tree once.
    pub fn new(delegate: D) -> Result<Self, TreeError> {
        let mut controller = Self {
            store: NodeStore::new(),
            delegate,
        };
        controller.rebuild()?;
        Ok(controller)
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn root(&self) -> NodeId {
        self.store.root()
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Mutable access to the delegate (filter state, data source).
    ///
    /// Nothing is recomputed here; reconcile again afterwards.
    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    /// Reconcile the children of one node and return them.
    ///
    /// `Ok(None)` for leaves. Otherwise the returned list is also stored as
    /// the node's children, releasing nodes that are no longer present.
    pub fn children(&mut self, node: NodeId) -> Result<Option<Vec<NodeId>>, TreeError> {
        let computed = self.delegate.child_nodes(&mut self.store, node)?;
        match &computed {
            Some(children) => self.store.replace_children(node, children.clone())?,
            None => self.store.replace_children(node, Vec::new())?,
        }
        Ok(computed)
    }

    /// Reconcile every expandable node, top down.
    ///
    /// Returns true if any child list anywhere in the tree changed.
    pub fn rebuild(&mut self) -> Result<bool, TreeError> {
        let changed = self.rebuild_child_nodes(self.store.root())?;
        tracing::debug!(changed, nodes = self.store.len(), "Rebuilt tree");
        Ok(changed)
    }

    fn rebuild_child_nodes(&mut self, node: NodeId) -> Result<bool, TreeError> {
        if !self.store.node(node)?.can_have_child_nodes() {
            return Ok(false);
        }

        let before = self.store.children(node)?.to_vec();
        let children = self
            .delegate
            .child_nodes(&mut self.store, node)?
            .unwrap_or_default();
        let mut changed = before != children;
        self.store.replace_children(node, children.clone())?;

        for child in children {
            if self.rebuild_child_nodes(child)? {
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Pre-order walk of the whole tree, root first.
    pub fn visit_nodes(&self, mut visit: impl FnMut(NodeId)) {
        self.store.visit(self.store.root(), |id, _| visit(id));
    }

    /// The node for `represented` anywhere in the tree, root included.
    pub fn node_representing(&self, represented: &Represented) -> Option<NodeId> {
        let root = self.store.root();
        if self.store.get(root)?.represented() == represented {
            return Some(root);
        }
        self.store.descendant_representing(root, represented)
    }

    pub fn node_for_item(&self, id: &SidebarItemId) -> Option<NodeId> {
        self.store
            .descendant_where(self.store.root(), |node| node.represented().item_id() == Some(id))
    }

    /// Drop every node whose ancestor is also selected.
    pub fn normalized_selected_nodes(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|&node| !self.store.has_ancestor_in(node, nodes))
            .collect()
    }
}
