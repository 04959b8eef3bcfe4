use generational_arena::Arena;
use std::collections::HashSet;

use super::node::{Node, NodeId, Represented};
use super::TreeError;

/// Owner of every presentation node.
///
/// Nodes live in a generational arena. A node stays alive while its parent
/// lists it as a child; [`replace_children`](Self::replace_children) releases
/// whatever subtree falls out of the list. The root lives as long as the store.
#[derive(Debug)]
pub struct NodeStore {
    arena: Arena<Node>,
    root: NodeId,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let mut root = Node::new(Represented::Root, None);
        root.can_have_child_nodes = true;
        let root = NodeId(arena.insert(root));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id.0)
    }

    /// Like [`get`](Self::get) but a stale handle is an error.
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.arena.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], TreeError> {
        Ok(self.node(id)?.children())
    }

    pub fn represented(&self, id: NodeId) -> Result<&Represented, TreeError> {
        Ok(self.node(id)?.represented())
    }

    // ========================================================================
    // Materialization
    // ========================================================================

    /// The child of `parent` representing `represented`, if there is one.
    pub fn find_child(&self, parent: NodeId, represented: &Represented) -> Option<NodeId> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|&child| {
                self.get(child)
                    .is_some_and(|node| &node.represented == represented)
            })
    }

    /// Return the existing child of `parent` for `represented`, or create one.
    ///
    /// A created node is appended to `parent`'s current children so a second
    /// request in the same pass finds it instead of making a duplicate. New
    /// nodes are leaves and not group items until the caller marks them.
    pub fn existing_or_new_child(
        &mut self,
        parent: NodeId,
        represented: Represented,
    ) -> Result<NodeId, TreeError> {
        if let Some(existing) = self.find_child(parent, &represented) {
            return Ok(existing);
        }
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode(parent));
        }
        if represented == Represented::Root {
            return Err(TreeError::InvalidState(format!(
                "cannot create a second root under {}",
                parent
            )));
        }

        let child = NodeId(self.arena.insert(Node::new(represented, Some(parent))));
        self.node_mut(parent)?.children.push(child);
        tracing::trace!(parent = %parent, child = %child, "Created node");
        Ok(child)
    }

    pub fn set_can_have_child_nodes(&mut self, id: NodeId, value: bool) -> Result<(), TreeError> {
        self.node_mut(id)?.can_have_child_nodes = value;
        Ok(())
    }

    pub fn set_group_item(&mut self, id: NodeId, value: bool) -> Result<(), TreeError> {
        self.node_mut(id)?.is_group_item = value;
        Ok(())
    }

    /// Swap `id`'s child list for `new_children`.
    ///
    /// Every entry must already be a child of `id` (found or created through
    /// this store) and may appear once. Former children missing from the new
    /// list are released along with their subtrees.
    pub fn replace_children(
        &mut self,
        id: NodeId,
        new_children: Vec<NodeId>,
    ) -> Result<(), TreeError> {
        let mut seen = HashSet::with_capacity(new_children.len());
        for &child in &new_children {
            let node = self.node(child)?;
            if node.parent != Some(id) {
                return Err(TreeError::InvalidState(format!(
                    "{} is not a child of {}",
                    child, id
                )));
            }
            if !seen.insert(child) {
                return Err(TreeError::InvalidState(format!(
                    "{} listed twice under {}",
                    child, id
                )));
            }
        }

        let old_children = std::mem::replace(&mut self.node_mut(id)?.children, new_children);
        let mut released = 0;
        for child in old_children {
            if !seen.contains(&child) {
                released += self.release(child);
            }
        }
        if released > 0 {
            tracing::trace!(node = %id, released, "Released dropped nodes");
        }
        Ok(())
    }

    /// Remove `id` and its subtree from the arena. Returns the node count removed.
    fn release(&mut self, id: NodeId) -> usize {
        let mut removed = 0;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.arena.remove(next.0) {
                pending.extend(node.children);
                removed += 1;
            }
        }
        removed
    }

    // ========================================================================
    // Structure Queries
    // ========================================================================

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.get(id)?.children.get(index).copied()
    }

    pub fn index_of_child(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.get(parent)?.children.iter().position(|&c| c == child)
    }

    /// Depth below the root (the root is level 0).
    pub fn level(&self, id: NodeId) -> Result<usize, TreeError> {
        let mut level = 0;
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            level += 1;
            current = self.node(parent)?;
        }
        Ok(level)
    }

    /// Child indexes from the root down to `id`, prefixed with the root's 0.
    pub fn index_path(&self, id: NodeId) -> Result<Vec<usize>, TreeError> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current)?.parent {
            let index = self.index_of_child(parent, current).ok_or_else(|| {
                TreeError::InvalidState(format!(
                    "{} names {} as parent but is not among its children",
                    current, parent
                ))
            })?;
            path.push(index);
            current = parent;
        }
        path.push(0);
        path.reverse();
        Ok(path)
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get(node).and_then(|n| n.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(parent).and_then(|n| n.parent);
        }
        false
    }

    pub fn has_ancestor_in(&self, node: NodeId, candidates: &[NodeId]) -> bool {
        candidates.iter().any(|&c| self.is_ancestor_of(c, node))
    }

    /// First descendant of `from` (pre-order, `from` excluded) matching `test`.
    pub fn descendant_where(
        &self,
        from: NodeId,
        mut test: impl FnMut(&Node) -> bool,
    ) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.get(from)?.children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.get(id)?;
            if test(node) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    pub fn descendant_representing(
        &self,
        from: NodeId,
        represented: &Represented,
    ) -> Option<NodeId> {
        self.descendant_where(from, |node| &node.represented == represented)
    }

    /// Call `visit` for `from` and every node below it, parents before children.
    pub fn visit(&self, from: NodeId, mut visit: impl FnMut(NodeId, &Node)) {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(id) {
                visit(id, node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }
}
