use crate::model::category::CategoryId;
use crate::model::tree::{CategoryRecord, CategoryTree};

/// Case-insensitive substring match on name or description.
/// `needle` must already be lowercased.
fn record_matches(record: &CategoryRecord, needle: &str) -> bool {
    record.name.to_lowercase().contains(needle)
        || record
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Prune the tree to matching nodes plus the ancestors needed to reach
/// them.
///
/// A node survives if it matches or if something below it matches. Its
/// child list is always the filtered one. A blank query returns the tree
/// unchanged.
pub fn filter_tree(tree: &CategoryTree, query: &str) -> CategoryTree {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return tree.clone();
    }

    let mut keep = vec![false; tree.len()];
    for &root in tree.roots() {
        mark_matches(tree, root, &needle, &mut keep);
    }
    tree.retain(&keep)
}

/// Post-order marking; returns whether `idx` is kept.
fn mark_matches(tree: &CategoryTree, idx: usize, needle: &str, keep: &mut [bool]) -> bool {
    let slot = tree.slot(idx);
    let mut any_child = false;
    for &child in &slot.children {
        if mark_matches(tree, child, needle, keep) {
            any_child = true;
        }
    }
    let kept = any_child || record_matches(&slot.record, needle);
    keep[idx] = kept;
    kept
}

/// Ids of the nodes that match the query themselves (not just ancestors).
pub fn direct_matches<'a>(tree: &'a CategoryTree, query: &str) -> Vec<&'a CategoryId> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    tree.preorder()
        .map(|idx| &tree.slot(idx).record)
        .filter(|record| record_matches(record, &needle))
        .map(|record| &record.id)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::{CategoryId, CategoryNode};
    use crate::ops::flatten::flatten;
    use pretty_assertions::assert_eq;

    fn scenario_tree() -> CategoryTree {
        CategoryTree::from_forest(vec![
            CategoryNode::new(1, "Resistors")
                .with_components(3)
                .with_children(vec![CategoryNode::new(2, "SMD").with_components(3)]),
        ])
        .unwrap()
    }

    fn parts_tree() -> CategoryTree {
        CategoryTree::from_forest(vec![
            CategoryNode::new(1, "Resistors").with_children(vec![
                CategoryNode::new(2, "SMD").with_description("Surface-mount chip resistors"),
                CategoryNode::new(3, "Through-hole"),
            ]),
            CategoryNode::new(4, "Capacitors").with_children(vec![
                CategoryNode::new(5, "Ceramic").with_children(vec![CategoryNode::new(6, "MLCC")]),
                CategoryNode::new(7, "Electrolytic"),
            ]),
            CategoryNode::new(8, "Connectors"),
        ])
        .unwrap()
    }

    fn ids(tree: &CategoryTree) -> Vec<String> {
        tree.preorder()
            .map(|i| tree.slot(i).record.id.to_string())
            .collect()
    }

    #[test]
    fn test_scenario_smd_keeps_ancestor() {
        let filtered = filter_tree(&scenario_tree(), "smd");
        assert_eq!(ids(&filtered), vec!["1", "2"]);
        let flat = flatten(&filtered);
        assert_eq!(flat[1].breadcrumb, "Resistors > SMD");
    }

    #[test]
    fn test_empty_query_returns_tree_unchanged() {
        let tree = parts_tree();
        assert_eq!(filter_tree(&tree, ""), tree);
        assert_eq!(filter_tree(&tree, "   "), tree);
        assert_eq!(filter_tree(&tree, "").to_forest(), tree.to_forest());
    }

    #[test]
    fn test_case_insensitive() {
        let filtered = filter_tree(&parts_tree(), "CERAMIC");
        assert_eq!(ids(&filtered), vec!["4", "5"]);
    }

    #[test]
    fn test_description_match() {
        let filtered = filter_tree(&parts_tree(), "surface-mount");
        assert_eq!(ids(&filtered), vec!["1", "2"]);
    }

    #[test]
    fn test_ancestor_only_node_carries_filtered_children() {
        let filtered = filter_tree(&parts_tree(), "mlcc");
        let forest = filtered.to_forest();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].name, "Capacitors");
        // Electrolytic is gone, only the Ceramic chain remains
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].children[0].name, "MLCC");
    }

    #[test]
    fn test_matching_node_drops_unmatched_children() {
        let filtered = filter_tree(&parts_tree(), "resistors");
        assert_eq!(ids(&filtered), vec!["1", "2"]); // SMD kept via its description
    }

    #[test]
    fn test_no_matches_yields_empty_forest() {
        let filtered = filter_tree(&parts_tree(), "inductor");
        assert!(filtered.is_empty());
        assert!(filtered.to_forest().is_empty());
    }

    #[test]
    fn test_every_kept_node_matches_or_has_matching_descendant() {
        let tree = parts_tree();
        for query in ["c", "o", "hole", "er", "x"] {
            let filtered = filter_tree(&tree, query);
            let needle = query.to_lowercase();
            for idx in filtered.preorder() {
                let self_match = record_matches(&filtered.slot(idx).record, &needle);
                let desc_match = filtered
                    .descendants(idx)
                    .into_iter()
                    .any(|d| record_matches(&filtered.slot(d).record, &needle));
                assert!(self_match || desc_match, "query {query:?} kept a non-match");
            }
        }
    }

    #[test]
    fn test_substring_not_fuzzy() {
        // "cpcts" is a subsequence of Capacitors but not a substring
        assert!(filter_tree(&parts_tree(), "cpcts").is_empty());
    }

    #[test]
    fn test_direct_matches() {
        let tree = parts_tree();
        let hits = direct_matches(&tree, "mlcc");
        assert_eq!(hits, vec![&CategoryId::from(6)]);
        assert!(direct_matches(&tree, "").is_empty());
    }
}
