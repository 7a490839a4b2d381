//! Resolution of a batch selection to the authoritative id list.

use std::collections::HashSet;

use crate::models::BatchSelection;

/// Apply exclusions and drop duplicates, keeping first occurrences in order.
///
/// `candidates` is the explicit id list, or every matching test case when
/// `select_all` is set.
pub fn finalize_ids(candidates: Vec<String>, selection: &BatchSelection) -> Vec<String> {
    let excluded: HashSet<&str> = selection.exclude_ids.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    candidates
        .into_iter()
        .filter(|id| !excluded.contains(id.as_str()))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
