//! Flattened, expansion-aware view of the sidebar tree.
//!
//! The tree holds every reconciled node; the outline is what a list view
//! shows: one section per top-level group, each listing its rows in order.
//! A folder row is followed by its own feeds when the folder is expanded.
//! Comparing two outlines yields the row inserts, deletes and moves a view
//! needs to animate from one to the other.

mod diff;

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::tree::{NodeId, NodeStore, Represented, TreeError};

pub use diff::{sequence_changes, SequenceChanges};

// ============================================================================
// Expansion State
// ============================================================================

/// Which containers (sections and folders) are expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<Represented>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, container: &Represented) -> bool {
        self.expanded.contains(container)
    }

    /// Returns true if the state changed.
    pub fn expand(&mut self, container: Represented) -> bool {
        self.expanded.insert(container)
    }

    pub fn collapse(&mut self, container: &Represented) -> bool {
        self.expanded.remove(container)
    }

    /// Flip the state and return the new one.
    pub fn toggle(&mut self, container: Represented) -> bool {
        if self.expanded.remove(&container) {
            false
        } else {
            self.expanded.insert(container);
            true
        }
    }

    /// Expand every section under the root and every folder directly in them.
    pub fn expand_all_sections_and_folders(&mut self, store: &NodeStore) {
        for &section in store.get(store.root()).map(|n| n.children()).unwrap_or_default() {
            let Some(node) = store.get(section) else {
                continue;
            };
            self.expanded.insert(node.represented().clone());
            for &child in node.children() {
                if let Some(child) = store.get(child) {
                    if child.represented().is_folder() {
                        self.expanded.insert(child.represented().clone());
                    }
                }
            }
        }
    }

    /// Collapse every folder directly under a section. Sections stay as they are.
    pub fn collapse_all_folders(&mut self) {
        self.expanded.retain(|container| !container.is_folder());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Represented> {
        self.expanded.iter()
    }
}

impl FromIterator<Represented> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = Represented>>(iter: I) -> Self {
        Self {
            expanded: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Outline
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineRow {
    pub node: NodeId,
    /// 0 for rows directly under a section, 1 for rows inside a folder.
    pub depth: usize,
    /// Whether the row is an expanded container.
    pub expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineSection {
    pub node: NodeId,
    pub key: Represented,
    pub rows: Vec<OutlineRow>,
}

/// Row edits for one section, indexed as the view's rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionChanges {
    pub section: usize,
    pub rows: SequenceChanges,
    /// New-side rows whose expansion state flipped (disclosure needs redraw).
    pub reloads: BTreeSet<usize>,
}

impl SectionChanges {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.reloads.is_empty()
    }
}

/// Everything that changed between two outlines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineChanges {
    pub sections: SequenceChanges,
    pub rows: Vec<SectionChanges>,
}

impl OutlineChanges {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.rows.iter().all(SectionChanges::is_empty)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    sections: Vec<OutlineSection>,
}

impl Outline {
    /// Flatten the reconciled tree in `store` under `expansion`.
    pub fn build(store: &NodeStore, expansion: &ExpansionState) -> Result<Self, TreeError> {
        let mut sections = Vec::new();

        for &section in store.children(store.root())? {
            let section_node = store.node(section)?;
            let key = section_node.represented().clone();
            let mut rows = Vec::new();

            if expansion.is_expanded(&key) {
                for &child in section_node.children() {
                    let child_node = store.node(child)?;
                    let expanded = child_node.can_have_child_nodes()
                        && expansion.is_expanded(child_node.represented());
                    rows.push(OutlineRow {
                        node: child,
                        depth: 0,
                        expanded,
                    });
                    if expanded {
                        rows.extend(child_node.children().iter().map(|&grandchild| OutlineRow {
                            node: grandchild,
                            depth: 1,
                            expanded: false,
                        }));
                    }
                }
            }

            sections.push(OutlineSection {
                node: section,
                key,
                rows,
            });
        }

        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[OutlineSection] {
        &self.sections
    }

    pub fn row_count(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }

    pub fn node_at(&self, section: usize, row: usize) -> Option<NodeId> {
        self.sections.get(section)?.rows.get(row).map(|r| r.node)
    }

    /// `(section, row)` of the row showing `node`.
    pub fn position_of(&self, node: NodeId) -> Option<(usize, usize)> {
        self.sections.iter().enumerate().find_map(|(s, section)| {
            section
                .rows
                .iter()
                .position(|r| r.node == node)
                .map(|row| (s, row))
        })
    }

    /// Edits turning `old` into `self`.
    ///
    /// Sections are matched by key, rows by node identity. A section that is
    /// new reports all of its rows as inserts.
    pub fn changes_from(&self, old: &Outline) -> OutlineChanges {
        let old_keys: Vec<&Represented> = old.sections.iter().map(|s| &s.key).collect();
        let new_keys: Vec<&Represented> = self.sections.iter().map(|s| &s.key).collect();
        let sections = sequence_changes(&old_keys, &new_keys);

        let old_by_key: HashMap<&Represented, &OutlineSection> =
            old.sections.iter().map(|s| (&s.key, s)).collect();

        let rows = self
            .sections
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let old_rows: &[OutlineRow] = old_by_key
                    .get(&section.key)
                    .map(|s| s.rows.as_slice())
                    .unwrap_or_default();

                let old_nodes: Vec<NodeId> = old_rows.iter().map(|r| r.node).collect();
                let new_nodes: Vec<NodeId> = section.rows.iter().map(|r| r.node).collect();

                let old_expanded: HashMap<NodeId, bool> =
                    old_rows.iter().map(|r| (r.node, r.expanded)).collect();
                let reloads = section
                    .rows
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| {
                        old_expanded
                            .get(&row.node)
                            .is_some_and(|&was| was != row.expanded)
                    })
                    .map(|(i, _)| i)
                    .collect();

                SectionChanges {
                    section: index,
                    rows: sequence_changes(&old_nodes, &new_nodes),
                    reloads,
                }
            })
            .collect();

        OutlineChanges { sections, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountId, Feed, Folder, SidebarItemId, SmartFeed, Snapshot};
    use crate::tree::SidebarTree;

    fn feed(id: &str, name: &str, unread: u64) -> Feed {
        Feed {
            id: id.to_string(),
            name: name.to_string(),
            unread_count: unread,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            smart_feeds: vec![SmartFeed {
                id: "today".to_string(),
                name: "Today".to_string(),
                unread_count: 0,
            }],
            accounts: vec![Account {
                id: "local".to_string(),
                name: "On My Device".to_string(),
                active: true,
                feeds: vec![feed("1", "Alpha", 1), feed("2", "Zeta", 0)],
                folders: vec![Folder {
                    name: "Tech".to_string(),
                    feeds: vec![feed("3", "Rust Blog", 4)],
                }],
            }],
        }
    }

    fn account() -> Represented {
        Represented::Account(AccountId::new("local"))
    }

    fn tech() -> Represented {
        Represented::Item(SidebarItemId::folder("local", "Tech"))
    }

    #[test]
    fn test_collapsed_sections_have_no_rows() {
        let tree = SidebarTree::with_source(snapshot()).unwrap();
        let outline = Outline::build(tree.store(), &ExpansionState::new()).unwrap();

        assert_eq!(outline.sections().len(), 2);
        assert_eq!(outline.sections()[0].key, Represented::SmartFeeds);
        assert_eq!(outline.row_count(), 0);
    }

    #[test]
    fn test_expanded_folder_rows_follow_folder() {
        let tree = SidebarTree::with_source(snapshot()).unwrap();
        let expansion: ExpansionState = [account(), tech()].into_iter().collect();
        let outline = Outline::build(tree.store(), &expansion).unwrap();

        let rows = &outline.sections()[1].rows;
        let reps: Vec<String> = rows
            .iter()
            .map(|r| tree.store().represented(r.node).unwrap().to_string())
            .collect();
        assert_eq!(
            reps,
            vec!["feed:local/1", "feed:local/2", "folder:local/Tech", "feed:local/3"]
        );
        assert!(rows[2].expanded);
        assert_eq!(rows[3].depth, 1);
    }

    #[test]
    fn test_expand_all_then_collapse_folders() {
        let tree = SidebarTree::with_source(snapshot()).unwrap();
        let mut expansion = ExpansionState::new();
        expansion.expand_all_sections_and_folders(tree.store());

        assert!(expansion.is_expanded(&Represented::SmartFeeds));
        assert!(expansion.is_expanded(&account()));
        assert!(expansion.is_expanded(&tech()));

        expansion.collapse_all_folders();
        assert!(!expansion.is_expanded(&tech()));
        assert!(expansion.is_expanded(&account()));
    }

    #[test]
    fn test_toggle_reports_new_state() {
        let mut expansion = ExpansionState::new();
        assert!(expansion.toggle(tech()));
        assert!(!expansion.toggle(tech()));
        assert!(!expansion.collapse(&tech()));
    }

    #[test]
    fn test_filter_change_produces_row_delete() {
        let mut tree = SidebarTree::with_source(snapshot()).unwrap();
        let expansion: ExpansionState = [account()].into_iter().collect();
        let before = Outline::build(tree.store(), &expansion).unwrap();

        tree.set_read_filtered(true);
        tree.rebuild().unwrap();
        let after = Outline::build(tree.store(), &expansion).unwrap();

        let changes = after.changes_from(&before);
        assert!(changes.sections.is_empty());
        assert_eq!(changes.rows[1].rows.deletes, [1].into_iter().collect());
        assert!(changes.rows[1].rows.inserts.is_empty());
        assert!(changes.rows[0].is_empty());
    }

    #[test]
    fn test_expanding_folder_inserts_rows_and_reloads_folder() {
        let tree = SidebarTree::with_source(snapshot()).unwrap();
        let mut expansion: ExpansionState = [account()].into_iter().collect();
        let before = Outline::build(tree.store(), &expansion).unwrap();

        expansion.expand(tech());
        let after = Outline::build(tree.store(), &expansion).unwrap();

        let changes = after.changes_from(&before);
        assert_eq!(changes.rows[1].rows.inserts, [3].into_iter().collect());
        assert_eq!(changes.rows[1].reloads, [2].into_iter().collect());
    }

    #[test]
    fn test_unchanged_tree_has_no_changes() {
        let mut tree = SidebarTree::with_source(snapshot()).unwrap();
        let mut expansion = ExpansionState::new();
        expansion.expand_all_sections_and_folders(tree.store());
        let before = Outline::build(tree.store(), &expansion).unwrap();

        tree.rebuild().unwrap();
        let after = Outline::build(tree.store(), &expansion).unwrap();
        assert!(after.changes_from(&before).is_empty());
    }

    #[test]
    fn test_position_of_row() {
        let tree = SidebarTree::with_source(snapshot()).unwrap();
        let expansion: ExpansionState = [account(), tech()].into_iter().collect();
        let outline = Outline::build(tree.store(), &expansion).unwrap();

        let rust = tree
            .node_for_item(&SidebarItemId::feed("local", "3"))
            .unwrap();
        assert_eq!(outline.position_of(rust), Some((1, 3)));
        assert_eq!(outline.node_at(1, 3), Some(rust));
        assert_eq!(outline.node_at(5, 0), None);
    }
}
