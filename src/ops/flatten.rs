use crate::model::category::{BREADCRUMB_SEPARATOR, CategoryId, FlatCategoryOption};
use crate::model::tree::CategoryTree;

/// Flatten the forest into a pre-order list of breadcrumb options.
///
/// Breadcrumbs are built while walking down, so a node's breadcrumb is
/// always the chain of names it was reached through.
pub fn flatten(tree: &CategoryTree) -> Vec<FlatCategoryOption> {
    flatten_excluding(tree, None)
}

/// Flatten, skipping the subtree rooted at `excluded` (the node and
/// everything under it).
pub(crate) fn flatten_excluding(
    tree: &CategoryTree,
    excluded: Option<&CategoryId>,
) -> Vec<FlatCategoryOption> {
    let mut out = Vec::with_capacity(tree.len());
    flatten_inner(tree, tree.roots(), None, 0, excluded, &mut out);
    out
}

fn flatten_inner(
    tree: &CategoryTree,
    indices: &[usize],
    parent_breadcrumb: Option<&str>,
    depth: usize,
    excluded: Option<&CategoryId>,
    out: &mut Vec<FlatCategoryOption>,
) {
    for &idx in indices {
        let slot = tree.slot(idx);
        let record = &slot.record;
        if excluded == Some(&record.id) {
            continue;
        }

        let breadcrumb = match parent_breadcrumb {
            Some(parent) => format!("{}{}{}", parent, BREADCRUMB_SEPARATOR, record.name),
            None => record.name.clone(),
        };

        out.push(FlatCategoryOption {
            id: record.id.clone(),
            name: record.name.clone(),
            breadcrumb: breadcrumb.clone(),
            depth,
        });

        flatten_inner(
            tree,
            &slot.children,
            Some(&breadcrumb),
            depth + 1,
            excluded,
            out,
        );
    }
}
