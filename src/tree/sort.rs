//! Sidebar ordering rules.
//!
//! Names compare case-insensitively. Equal keys keep the order the caller
//! passed in, which the reconciler arranges to be the nodes' current order.
use std::cmp::Ordering;

use super::node::NodeId;

/// A node paired with the data it is sorted by.
#[derive(Debug, Clone)]
pub(crate) struct SortEntry<'a> {
    pub node: NodeId,
    pub name: &'a str,
    pub is_folder: bool,
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Alphabetical, stable.
pub(crate) fn sort_alphabetically(entries: &mut [SortEntry<'_>]) {
    entries.sort_by(|a, b| compare_names(a.name, b.name));
}

/// Alphabetical with every folder after every feed, stable.
pub(crate) fn sort_alphabetically_with_folders_at_end(entries: &mut [SortEntry<'_>]) {
    entries.sort_by(|a, b| {
        a.is_folder
            .cmp(&b.is_folder)
            .then_with(|| compare_names(a.name, b.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use generational_arena::Index;

    fn entry(slot: usize, name: &str, is_folder: bool) -> SortEntry<'_> {
        SortEntry {
            node: NodeId(Index::from_raw_parts(slot, 0)),
            name,
            is_folder,
        }
    }

    fn names<'a>(entries: &[SortEntry<'a>]) -> Vec<&'a str> {
        entries.iter().map(|e| e.name).collect()
    }

    #[test]
    fn test_compare_names_ignores_case() {
        assert_eq!(compare_names("alpha", "Beta"), Ordering::Less);
        assert_eq!(compare_names("ZETA", "alpha"), Ordering::Greater);
        assert_eq!(compare_names("Rust", "rust"), Ordering::Equal);
    }

    #[test]
    fn test_folders_sort_after_feeds() {
        let mut entries = vec![
            entry(0, "Beta", true),
            entry(1, "Zeta", false),
            entry(2, "alpha", false),
            entry(3, "Apps", true),
        ];
        sort_alphabetically_with_folders_at_end(&mut entries);
        assert_eq!(names(&entries), vec!["alpha", "Zeta", "Apps", "Beta"]);
    }

    #[test]
    fn test_equal_names_keep_input_order() {
        let mut entries = vec![entry(7, "News", false), entry(3, "news", false)];
        sort_alphabetically(&mut entries);
        assert_eq!(entries[0].node, NodeId(Index::from_raw_parts(7, 0)));
        assert_eq!(entries[1].node, NodeId(Index::from_raw_parts(3, 0)));
    }
}
