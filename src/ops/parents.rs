use crate::model::category::{CategoryId, FlatCategoryOption};
use crate::model::tree::CategoryTree;
use crate::ops::flatten::{flatten, flatten_excluding};
use crate::ops::validate::ValidationError;

/// Valid parents for a category being created (`editing == None`) or
/// edited.
///
/// When editing, the node and its whole subtree are left out. That is the
/// only way reparenting could close a cycle. This is a usability guard
/// only; the backend is what actually keeps the tree acyclic.
pub fn parent_options(tree: &CategoryTree, editing: Option<&CategoryId>) -> Vec<FlatCategoryOption> {
    flatten_excluding(tree, editing)
}

/// Where a deleted category's components may be moved: every category
/// except the one being deleted.
pub fn reassignment_targets(tree: &CategoryTree, deleting: &CategoryId) -> Vec<FlatCategoryOption> {
    flatten(tree)
        .into_iter()
        .filter(|option| &option.id != deleting)
        .collect()
}

/// Check a freely chosen parent against the same rule as
/// [`parent_options`]. `None` (move to root) is always allowed.
pub fn validate_parent(
    tree: &CategoryTree,
    editing: Option<&CategoryId>,
    parent: Option<&CategoryId>,
) -> Result<(), ValidationError> {
    let Some(parent) = parent else {
        return Ok(());
    };
    let parent_idx = tree
        .index_of(parent)
        .ok_or_else(|| ValidationError::UnknownParent(parent.clone()))?;
    let Some(editing) = editing else {
        return Ok(());
    };
    if editing == parent {
        return Err(ValidationError::SelfParent);
    }
    if let Some(editing_idx) = tree.index_of(editing)
        && tree.is_within(editing_idx, parent_idx)
    {
        return Err(ValidationError::DescendantParent(parent.clone()));
    }
    Ok(())
}
