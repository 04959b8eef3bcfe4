//! The sidebar's child rules: sections at the top, smart feeds, and
//! filtered, sorted container contents.
use std::collections::HashSet;

use super::controller::{TreeController, TreeDelegate};
use super::node::{NodeId, Represented};
use super::sort::{sort_alphabetically_with_folders_at_end, SortEntry};
use super::store::NodeStore;
use super::TreeError;
use crate::domain::{ContainerId, ItemSummary, SidebarItemId, SidebarSource};

/// The sidebar tree: sections, smart feeds, then the default account's feeds.
pub type SidebarTree<S> = TreeController<SidebarDelegate<S>>;

/// Child rules for the sidebar plus the read filter they apply.
///
/// With the read filter on, feeds and folders without unread articles are
/// hidden unless their id is in the exception set. Smart feeds are never
/// filtered.
#[derive(Debug)]
pub struct SidebarDelegate<S> {
    source: S,
    filter_exceptions: HashSet<SidebarItemId>,
    is_read_filtered: bool,
}

impl<S: SidebarSource> SidebarDelegate<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            filter_exceptions: HashSet::new(),
            is_read_filtered: false,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Swap in a newer domain snapshot. Returns the previous one.
    pub fn replace_source(&mut self, source: S) -> S {
        std::mem::replace(&mut self.source, source)
    }

    pub fn is_read_filtered(&self) -> bool {
        self.is_read_filtered
    }

    pub fn set_read_filtered(&mut self, value: bool) {
        self.is_read_filtered = value;
    }

    /// Keep `id` visible while the read filter is on.
    pub fn add_filter_exception(&mut self, id: SidebarItemId) {
        self.filter_exceptions.insert(id);
    }

    pub fn reset_filter_exceptions(&mut self) {
        self.filter_exceptions.clear();
    }

    pub fn filter_exceptions(&self) -> &HashSet<SidebarItemId> {
        &self.filter_exceptions
    }

    fn is_visible(&self, item: &ItemSummary) -> bool {
        !(self.is_read_filtered
            && item.unread_count == 0
            && !self.filter_exceptions.contains(&item.id))
    }

    // ========================================================================
    // Rules
    // ========================================================================

    fn child_nodes_for_root(
        &self,
        store: &mut NodeStore,
        root: NodeId,
    ) -> Result<Vec<NodeId>, TreeError> {
        let mut sections = Vec::with_capacity(2);

        let smart_feeds = store.existing_or_new_child(root, Represented::SmartFeeds)?;
        store.set_can_have_child_nodes(smart_feeds, true)?;
        store.set_group_item(smart_feeds, true)?;
        sections.push(smart_feeds);

        if let Some(account) = self.source.active_account() {
            let feeds = store.existing_or_new_child(root, Represented::Account(account))?;
            store.set_can_have_child_nodes(feeds, true)?;
            store.set_group_item(feeds, true)?;
            sections.push(feeds);
        }

        Ok(sections)
    }

    fn child_nodes_for_smart_feeds(
        &self,
        store: &mut NodeStore,
        node: NodeId,
    ) -> Result<Vec<NodeId>, TreeError> {
        let mut children = Vec::new();
        for smart_feed in self.source.smart_feeds() {
            let child = store.existing_or_new_child(node, Represented::Item(smart_feed.id))?;
            if !children.contains(&child) {
                children.push(child);
            }
        }
        Ok(children)
    }

    fn child_nodes_for_container(
        &self,
        store: &mut NodeStore,
        node: NodeId,
        container: &ContainerId,
    ) -> Result<Vec<NodeId>, TreeError> {
        let Some(contents) = self.source.container_children(container) else {
            tracing::debug!(node = %node, ?container, "Container missing from snapshot");
            return Ok(Vec::new());
        };

        let candidates: Vec<ItemSummary> = contents
            .feeds
            .into_iter()
            .chain(contents.folders)
            .filter(|item| self.is_visible(item))
            .collect();

        let mut updated: Vec<SortEntry<'_>> = Vec::with_capacity(candidates.len());
        let mut kept = 0;
        let mut created = 0;

        for item in &candidates {
            let represented = Represented::Item(item.id.clone());
            let node_id = match store.find_child(node, &represented) {
                Some(existing) => {
                    if updated.iter().any(|e| e.node == existing) {
                        continue;
                    }
                    kept += 1;
                    existing
                }
                None => {
                    let child = store.existing_or_new_child(node, represented)?;
                    if item.id.is_folder() {
                        store.set_can_have_child_nodes(child, true)?;
                    }
                    created += 1;
                    child
                }
            };
            updated.push(SortEntry {
                node: node_id,
                name: &item.name,
                is_folder: item.id.is_folder(),
            });
        }

        // Ties keep the nodes' current order; new nodes were appended last
        let current = store.children(node)?;
        updated.sort_by_key(|e| current.iter().position(|&c| c == e.node));
        sort_alphabetically_with_folders_at_end(&mut updated);

        tracing::debug!(
            node = %node,
            candidates = candidates.len(),
            kept,
            created,
            "Reconciled container"
        );
        Ok(updated.into_iter().map(|e| e.node).collect())
    }
}

impl<S: SidebarSource> TreeDelegate for SidebarDelegate<S> {
    fn child_nodes(
        &mut self,
        store: &mut NodeStore,
        node: NodeId,
    ) -> Result<Option<Vec<NodeId>>, TreeError> {
        let represented = store.represented(node)?.clone();
        let is_root = store.node(node)?.is_root();

        match represented {
            Represented::Root if is_root => self.child_nodes_for_root(store, node).map(Some),
            Represented::Root => {
                tracing::error!(node = %node, "Non-root node represents the root");
                Err(TreeError::InvalidState(format!(
                    "{} represents the root but has a parent",
                    node
                )))
            }
            Represented::SmartFeeds => self.child_nodes_for_smart_feeds(store, node).map(Some),
            other => match other.container() {
                Some(container) => self
                    .child_nodes_for_container(store, node, &container)
                    .map(Some),
                None => Ok(None),
            },
        }
    }
}

impl<S: SidebarSource> SidebarTree<S> {
    /// Build a sidebar over `source` with the read filter off.
    pub fn with_source(source: S) -> Result<Self, TreeError> {
        Self::new(SidebarDelegate::new(source))
    }

    pub fn is_read_filtered(&self) -> bool {
        self.delegate().is_read_filtered()
    }

    pub fn set_read_filtered(&mut self, value: bool) {
        self.delegate_mut().set_read_filtered(value);
    }

    pub fn add_filter_exception(&mut self, id: SidebarItemId) {
        self.delegate_mut().add_filter_exception(id);
    }

    pub fn reset_filter_exceptions(&mut self) {
        self.delegate_mut().reset_filter_exceptions();
    }

    /// Install a newer snapshot and rebuild. Returns true if any row changed.
    pub fn update_source(&mut self, source: S) -> Result<bool, TreeError> {
        self.delegate_mut().replace_source(source);
        self.rebuild()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, Feed, Folder, SmartFeed, Snapshot};
    use pretty_assertions::assert_eq;

    fn feed(id: &str, name: &str, unread: u64) -> Feed {
        Feed {
            id: id.to_string(),
            name: name.to_string(),
            unread_count: unread,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            smart_feeds: vec![
                SmartFeed {
                    id: "today".to_string(),
                    name: "Today".to_string(),
                    unread_count: 0,
                },
                SmartFeed {
                    id: "unread".to_string(),
                    name: "All Unread".to_string(),
                    unread_count: 2,
                },
            ],
            accounts: vec![Account {
                id: "local".to_string(),
                name: "On My Device".to_string(),
                active: true,
                feeds: vec![feed("z", "Zeta", 2), feed("a", "Alpha", 0)],
                folders: vec![Folder {
                    name: "Beta".to_string(),
                    feeds: vec![feed("b1", "Inside", 1)],
                }],
            }],
        }
    }

    fn names(tree: &SidebarTree<Snapshot>, nodes: &[NodeId]) -> Vec<String> {
        nodes
            .iter()
            .map(|&n| tree.store().represented(n).unwrap().to_string())
            .collect()
    }

    fn account_node(tree: &SidebarTree<Snapshot>) -> NodeId {
        tree.node_representing(&Represented::Account(crate::domain::AccountId::new("local")))
            .unwrap()
    }

    #[test]
    fn test_top_level_sections() {
        let mut tree = SidebarTree::with_source(snapshot()).unwrap();
        let root = tree.root();
        let sections = tree.children(root).unwrap().unwrap();
        assert_eq!(sections.len(), 2);

        for &section in &sections {
            let node = tree.store().node(section).unwrap();
            assert!(node.is_group_item());
            assert!(node.can_have_child_nodes());
        }
        assert_eq!(
            tree.store().represented(sections[0]).unwrap(),
            &Represented::SmartFeeds
        );
    }

    #[test]
    fn test_inactive_account_has_no_feeds_section() {
        let mut source = snapshot();
        source.accounts[0].active = false;
        let mut tree = SidebarTree::with_source(source).unwrap();
        let root = tree.root();
        assert_eq!(tree.children(root).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_filtered_container_hides_read_feeds() {
        let mut tree = SidebarTree::with_source(snapshot()).unwrap();
        tree.set_read_filtered(true);
        let account = account_node(&tree);

        let children = tree.children(account).unwrap().unwrap();
        assert_eq!(
            names(&tree, &children),
            vec!["feed:local/z", "folder:local/Beta"]
        );
    }

    #[test]
    fn test_filter_exception_keeps_read_feed() {
        let mut tree = SidebarTree::with_source(snapshot()).unwrap();
        tree.set_read_filtered(true);
        tree.add_filter_exception(SidebarItemId::feed("local", "a"));
        let account = account_node(&tree);

        let children = tree.children(account).unwrap().unwrap();
        assert_eq!(
            names(&tree, &children),
            vec!["feed:local/a", "feed:local/z", "folder:local/Beta"]
        );

        tree.reset_filter_exceptions();
        let children = tree.children(account).unwrap().unwrap();
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_smart_feeds_ignore_read_filter() {
        let mut tree = SidebarTree::with_source(snapshot()).unwrap();
        let smart = tree.node_representing(&Represented::SmartFeeds).unwrap();

        let unfiltered = tree.children(smart).unwrap().unwrap();
        tree.set_read_filtered(true);
        let filtered = tree.children(smart).unwrap().unwrap();

        assert_eq!(unfiltered, filtered);
        // Provider order, not alphabetical
        assert_eq!(
            names(&tree, &filtered),
            vec!["smartFeed:today", "smartFeed:unread"]
        );
    }

    #[test]
    fn test_folder_nodes_are_containers() {
        let tree = SidebarTree::with_source(snapshot()).unwrap();
        let folder = tree
            .node_for_item(&SidebarItemId::folder("local", "Beta"))
            .unwrap();
        let feed = tree.node_for_item(&SidebarItemId::feed("local", "z")).unwrap();

        assert!(tree.store().node(folder).unwrap().can_have_child_nodes());
        assert!(!tree.store().node(feed).unwrap().can_have_child_nodes());
        assert!(!tree.store().node(folder).unwrap().is_group_item());
    }

    #[test]
    fn test_reconcile_keeps_node_identity() {
        let mut tree = SidebarTree::with_source(snapshot()).unwrap();
        let account = account_node(&tree);
        let first = tree.children(account).unwrap().unwrap();
        let second = tree.children(account).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rename_resorts_without_new_nodes() {
        let mut tree = SidebarTree::with_source(snapshot()).unwrap();
        let account = account_node(&tree);
        let before = tree.children(account).unwrap().unwrap();

        let mut source = snapshot();
        source.accounts[0].feeds[1].name = "Zulu".to_string();
        tree.update_source(source).unwrap();
        let after = tree.children(account).unwrap().unwrap();

        // Renaming Alpha to Zulu moves the same node behind Zeta
        assert_eq!(after, vec![before[1], before[0], before[2]]);
    }

    #[test]
    fn test_duplicate_candidates_collapse() {
        let mut source = snapshot();
        source.accounts[0].feeds.push(feed("z", "Zeta", 2));
        let mut tree = SidebarTree::with_source(source).unwrap();
        let account = account_node(&tree);

        let children = tree.children(account).unwrap().unwrap();
        assert_eq!(
            names(&tree, &children),
            vec!["feed:local/a", "feed:local/z", "folder:local/Beta"]
        );
    }

    #[test]
    fn test_missing_folder_has_no_children() {
        let mut tree = SidebarTree::with_source(snapshot()).unwrap();
        let folder = tree
            .node_for_item(&SidebarItemId::folder("local", "Beta"))
            .unwrap();

        let mut source = snapshot();
        source.accounts[0].folders.clear();
        tree.delegate_mut().replace_source(source);

        assert_eq!(tree.children(folder).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_released_node_is_unknown() {
        let mut store = NodeStore::new();
        let root = store.root();
        let smart = store
            .existing_or_new_child(root, Represented::SmartFeeds)
            .unwrap();
        store.replace_children(root, Vec::new()).unwrap();

        let mut delegate = SidebarDelegate::new(snapshot());
        assert_eq!(
            delegate.child_nodes(&mut store, smart),
            Err(TreeError::UnknownNode(smart))
        );
    }

    #[test]
    fn test_huge_unread_counts_reconcile() {
        let mut source = snapshot();
        source.accounts[0].folders[0]
            .feeds
            .push(feed("max", "Max", u64::MAX));
        let mut tree = SidebarTree::with_source(source).unwrap();
        tree.set_read_filtered(true);
        let account = account_node(&tree);

        let children = tree.children(account).unwrap().unwrap();
        assert_eq!(
            names(&tree, &children),
            vec!["feed:local/z", "folder:local/Beta"]
        );
    }

    #[test]
    fn test_leaf_items_have_no_children() {
        let mut tree = SidebarTree::with_source(snapshot()).unwrap();
        let feed = tree.node_for_item(&SidebarItemId::feed("local", "z")).unwrap();
        let today = tree
            .node_for_item(&SidebarItemId::smart_feed("today"))
            .unwrap();
        assert_eq!(tree.children(feed).unwrap(), None);
        assert_eq!(tree.children(today).unwrap(), None);
    }
}
