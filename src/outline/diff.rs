use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Index-level edits that turn one sequence into another.
///
/// Indexes in `deletes` and in the `from` side of `moves` refer to the old
/// sequence; `inserts` and the `to` side of `moves` refer to the new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceChanges {
    pub deletes: BTreeSet<usize>,
    pub inserts: BTreeSet<usize>,
    pub moves: BTreeSet<(usize, usize)>,
}

impl SequenceChanges {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty() && self.moves.is_empty()
    }
}

/// Diff two sequences of unique elements.
///
/// Elements on the longest common subsequence stay put. Any other element
/// present on both sides is a move; the rest are deletes and inserts.
///
/// With unique elements the common subsequence is the longest increasing run
/// of new-side positions taken in old order, found in O(n log n).
pub fn sequence_changes<T: Eq + Hash>(old: &[T], new: &[T]) -> SequenceChanges {
    let new_index: HashMap<&T, usize> = new.iter().enumerate().map(|(j, t)| (t, j)).collect();
    let old_index: HashMap<&T, usize> = old.iter().enumerate().map(|(i, t)| (t, i)).collect();

    let mut changes = SequenceChanges::default();

    // (old index, new index) of every element present on both sides, in old order
    let mut shared = Vec::new();
    for (i, item) in old.iter().enumerate() {
        match new_index.get(item) {
            Some(&j) => shared.push((i, j)),
            None => {
                changes.deletes.insert(i);
            }
        }
    }
    for (j, item) in new.iter().enumerate() {
        if !old_index.contains_key(item) {
            changes.inserts.insert(j);
        }
    }

    let stays = longest_increasing(&shared);
    for (k, &(i, j)) in shared.iter().enumerate() {
        if !stays[k] {
            changes.moves.insert((i, j));
        }
    }
    changes
}

/// Marks the entries of `pairs` on a longest run with strictly increasing
/// new-side index.
fn longest_increasing(pairs: &[(usize, usize)]) -> Vec<bool> {
    // tails[len] = position in `pairs` ending the best run of length len + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; pairs.len()];

    for (k, &(_, j)) in pairs.iter().enumerate() {
        let len = tails.partition_point(|&t| pairs[t].1 < j);
        previous[k] = len.checked_sub(1).map(|p| tails[p]);
        if len == tails.len() {
            tails.push(k);
        } else {
            tails[len] = k;
        }
    }

    let mut stays = vec![false; pairs.len()];
    let mut current = tails.last().copied();
    while let Some(k) = current {
        stays[k] = true;
        current = previous[k];
    }
    stays
}
