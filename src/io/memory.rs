use std::cell::RefCell;

use crate::io::backend::{BackendError, CategoryBackend, DeleteRequest};
use crate::model::category::{CategoryDraft, CategoryId, CategoryNode};

/// In-process category store that behaves like the inventory backend.
///
/// Enforced here the same way the real service does:
/// - sibling names are unique (case-insensitive), else 409;
/// - parents must exist and must not sit inside the moved node, else 422;
/// - a node with children or components needs `force`, and one with
///   components also needs a `reassign_to` target, else 400.
///
/// A forced delete moves the node's components onto the target and lifts
/// its children up to the deleted node's parent.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RefCell<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Flat rows; `children` is always empty here
    rows: Vec<CategoryNode>,
    next_id: u64,
    /// One line per call, e.g. `DELETE 1 force=true reassign_to=2`
    calls: Vec<String>,
    /// Call-line prefix and the error to fail it with
    fail_on: Option<(String, BackendError)>,
}

impl MemoryState {
    fn position(&self, id: &CategoryId) -> Option<usize> {
        self.rows.iter().position(|row| &row.id == id)
    }

    fn children_of(&self, id: Option<&CategoryId>) -> impl Iterator<Item = &CategoryNode> {
        self.rows
            .iter()
            .filter(move |row| row.parent_id.as_ref() == id)
    }

    /// Whether `candidate` is `root` or lies below it
    fn is_within(&self, root: &CategoryId, candidate: &CategoryId) -> bool {
        let mut current = Some(candidate.clone());
        while let Some(id) = current {
            if &id == root {
                return true;
            }
            current = self
                .position(&id)
                .and_then(|pos| self.rows[pos].parent_id.clone());
        }
        false
    }

    fn check_name(
        &self,
        name: &str,
        parent: Option<&CategoryId>,
        skip: Option<&CategoryId>,
    ) -> Result<(), BackendError> {
        let clash = self
            .children_of(parent)
            .filter(|row| Some(&row.id) != skip)
            .any(|row| row.name.eq_ignore_ascii_case(name));
        if clash {
            return Err(BackendError::Conflict(format!(
                "Category '{}' already exists under this parent",
                name
            )));
        }
        Ok(())
    }

    fn check_parent(&self, parent: Option<&CategoryId>) -> Result<(), BackendError> {
        if let Some(parent) = parent
            && self.position(parent).is_none()
        {
            return Err(BackendError::Invalid {
                detail: Some(format!("parent category {} does not exist", parent)),
            });
        }
        Ok(())
    }

    fn subtree_total(&self, id: &CategoryId) -> u64 {
        let own = self
            .position(id)
            .map(|pos| self.rows[pos].component_count)
            .unwrap_or(0);
        own + self
            .children_of(Some(id))
            .map(|child| self.subtree_total(&child.id))
            .sum::<u64>()
    }

    fn nest(&self, parent: Option<&CategoryId>, include_empty: bool) -> Vec<CategoryNode> {
        self.children_of(parent)
            .filter(|row| include_empty || self.subtree_total(&row.id) > 0)
            .map(|row| {
                let mut node = row.clone();
                node.children = self.nest(Some(&row.id), include_empty);
                node
            })
            .collect()
    }
}

fn apply_draft(row: &mut CategoryNode, draft: &CategoryDraft) {
    row.name = draft.name.clone();
    row.description = draft.description.clone();
    row.parent_id = draft.parent_id.clone();
    row.color = draft.color.clone();
    row.icon = draft.icon.clone();
    row.sort_order = draft.sort_order;
}

fn not_found(id: &CategoryId) -> BackendError {
    BackendError::Status {
        status: 404,
        message: Some(format!("Category {} not found", id)),
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }

    /// Load a nested forest. Ids must be unique; `next_id` continues after
    /// the largest numeric id.
    pub fn from_forest(forest: Vec<CategoryNode>) -> Self {
        let mut state = MemoryState::default();
        fn push_rows(state: &mut MemoryState, nodes: Vec<CategoryNode>, parent: Option<&CategoryId>) {
            for mut node in nodes {
                let children = std::mem::take(&mut node.children);
                node.parent_id = parent.cloned();
                if let Ok(n) = node.id.as_str().parse::<u64>() {
                    state.next_id = state.next_id.max(n);
                }
                let id = node.id.clone();
                state.rows.push(node);
                push_rows(state, children, Some(&id));
            }
        }
        push_rows(&mut state, forest, None);
        MemoryBackend {
            state: RefCell::new(state),
        }
    }

    /// A small electronics catalog for `--demo`
    pub fn seeded() -> Self {
        MemoryBackend::from_forest(vec![
            CategoryNode::new(1, "Resistors")
                .with_description("Fixed and variable resistors")
                .with_components(4)
                .with_children(vec![
                    CategoryNode::new(2, "SMD").with_components(12),
                    CategoryNode::new(3, "Through-hole").with_components(7),
                    CategoryNode::new(4, "Potentiometers"),
                ]),
            CategoryNode::new(5, "Capacitors").with_children(vec![
                CategoryNode::new(6, "Ceramic")
                    .with_description("MLCC and disc capacitors")
                    .with_components(30),
                CategoryNode::new(7, "Electrolytic").with_components(9),
            ]),
            CategoryNode::new(8, "Integrated circuits").with_children(vec![
                CategoryNode::new(9, "Microcontrollers")
                    .with_components(5)
                    .with_children(vec![CategoryNode::new(10, "ARM Cortex-M").with_components(3)]),
                CategoryNode::new(11, "Op-amps").with_components(6),
            ]),
            CategoryNode::new(12, "Connectors"),
        ])
    }

    /// Make the next call fail with `err`
    pub fn fail_next(&self, err: BackendError) {
        self.fail_matching("", err);
    }

    /// Make the next call whose log line starts with `prefix` fail with
    /// `err`; calls before it go through
    pub fn fail_matching(&self, prefix: &str, err: BackendError) {
        self.state.borrow_mut().fail_on = Some((prefix.to_string(), err));
    }

    /// Calls received so far, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    fn record(&self, call: String) -> Result<(), BackendError> {
        let mut state = self.state.borrow_mut();
        let failing = matches!(&state.fail_on, Some((prefix, _)) if call.starts_with(prefix.as_str()));
        state.calls.push(call);
        match state.fail_on.take() {
            Some((_, err)) if failing => Err(err),
            pending => {
                state.fail_on = pending;
                Ok(())
            }
        }
    }
}

impl CategoryBackend for MemoryBackend {
    fn list(&self, include_empty: bool) -> Result<Vec<CategoryNode>, BackendError> {
        self.record(format!("GET include_empty={}", include_empty))?;
        Ok(self.state.borrow().nest(None, include_empty))
    }

    fn create(&self, draft: &CategoryDraft) -> Result<CategoryNode, BackendError> {
        self.record(format!("POST {}", draft.name))?;
        let mut state = self.state.borrow_mut();
        state.check_parent(draft.parent_id.as_ref())?;
        state.check_name(&draft.name, draft.parent_id.as_ref(), None)?;

        state.next_id += 1;
        let mut row = CategoryNode::new(state.next_id, draft.name.clone());
        apply_draft(&mut row, draft);
        state.rows.push(row.clone());
        Ok(row)
    }

    fn update(&self, id: &CategoryId, draft: &CategoryDraft) -> Result<CategoryNode, BackendError> {
        self.record(format!("PUT {}", id))?;
        let mut state = self.state.borrow_mut();
        let pos = state.position(id).ok_or_else(|| not_found(id))?;
        state.check_parent(draft.parent_id.as_ref())?;
        if let Some(parent) = &draft.parent_id
            && state.is_within(id, parent)
        {
            return Err(BackendError::Invalid {
                detail: Some("a category cannot be moved under itself".to_string()),
            });
        }
        state.check_name(&draft.name, draft.parent_id.as_ref(), Some(id))?;

        apply_draft(&mut state.rows[pos], draft);
        Ok(state.rows[pos].clone())
    }

    fn delete(&self, request: &DeleteRequest) -> Result<(), BackendError> {
        let mut call = format!("DELETE {} force={}", request.id, request.force);
        if let Some(target) = &request.reassign_to {
            call.push_str(&format!(" reassign_to={}", target));
        }
        self.record(call)?;

        let mut state = self.state.borrow_mut();
        let pos = state.position(&request.id).ok_or_else(|| not_found(&request.id))?;
        let count = state.rows[pos].component_count;
        let child_count = state.children_of(Some(&request.id)).count();

        if !request.force && (count > 0 || child_count > 0) {
            return Err(BackendError::Status {
                status: 400,
                message: Some(format!(
                    "Category has {} components and {} subcategories; use force to delete",
                    count, child_count
                )),
            });
        }

        if count > 0 {
            let target = request.reassign_to.as_ref().ok_or_else(|| BackendError::Status {
                status: 400,
                message: Some("reassign_to is required when the category has components".into()),
            })?;
            if target == &request.id {
                return Err(BackendError::Invalid {
                    detail: Some("cannot reassign components to the deleted category".into()),
                });
            }
            let target_pos = state.position(target).ok_or_else(|| not_found(target))?;
            state.rows[target_pos].component_count += count;
        }

        let parent = state.rows[pos].parent_id.clone();
        for row in state.rows.iter_mut() {
            if row.parent_id.as_ref() == Some(&request.id) {
                row.parent_id = parent.clone();
            }
        }
        state.rows.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(n: i32) -> CategoryId {
        CategoryId::from(n)
    }

    fn backend() -> MemoryBackend {
        MemoryBackend::from_forest(vec![
            CategoryNode::new(1, "Resistors")
                .with_components(3)
                .with_children(vec![CategoryNode::new(2, "SMD").with_components(3)]),
            CategoryNode::new(3, "Capacitors"),
        ])
    }

    #[test]
    fn test_list_nests_rows() {
        let forest = backend().list(true).unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].children[0].name, "SMD");
        assert_eq!(forest[0].children[0].parent_id, Some(id(1)));
    }

    #[test]
    fn test_list_hides_empty_when_asked() {
        let forest = backend().list(false).unwrap();
        let names: Vec<_> = forest.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Resistors"]);
    }

    #[test]
    fn test_create_assigns_next_id() {
        let b = backend();
        let mut draft = CategoryDraft::named("0402");
        draft.parent_id = Some(id(2));
        let created = b.create(&draft).unwrap();
        assert_eq!(created.id, id(4));
        assert_eq!(created.parent_id, Some(id(2)));
    }

    #[test]
    fn test_create_sibling_name_conflict() {
        let b = backend();
        let mut draft = CategoryDraft::named("smd");
        draft.parent_id = Some(id(1));
        assert!(matches!(b.create(&draft), Err(BackendError::Conflict(_))));
        // the same name under another parent is fine
        draft.parent_id = Some(id(3));
        assert!(b.create(&draft).is_ok());
    }

    #[test]
    fn test_update_rejects_cycle() {
        let b = backend();
        let mut draft = CategoryDraft::named("Resistors");
        draft.parent_id = Some(id(2));
        assert!(matches!(
            b.update(&id(1), &draft),
            Err(BackendError::Invalid { .. })
        ));
    }

    #[test]
    fn test_plain_delete_of_non_empty_rejected() {
        let b = backend();
        let err = b.delete(&DeleteRequest::plain(id(1))).unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 400, .. }));
        assert_eq!(b.list(true).unwrap().len(), 2);
    }

    #[test]
    fn test_forced_delete_reassigns_and_promotes_children() {
        let b = backend();
        b.delete(&DeleteRequest::reassigning(id(1), id(3))).unwrap();
        let forest = b.list(true).unwrap();
        let names: Vec<_> = forest.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["SMD", "Capacitors"]);
        assert_eq!(forest[1].component_count, 3);
        assert_eq!(forest[0].parent_id, None);
    }

    #[test]
    fn test_plain_delete_of_empty_leaf() {
        let b = backend();
        b.delete(&DeleteRequest::plain(id(3))).unwrap();
        assert_eq!(
            b.calls(),
            vec!["DELETE 3 force=false".to_string()]
        );
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let b = backend();
        b.fail_next(BackendError::Transport("connection reset".into()));
        assert!(b.list(true).is_err());
        assert!(b.list(true).is_ok());
    }

    #[test]
    fn test_fail_matching_skips_other_calls() {
        let b = backend();
        b.fail_matching("DELETE", BackendError::Transport("timed out".into()));
        assert!(b.list(true).is_ok());
        assert!(b.delete(&DeleteRequest::plain(id(3))).is_err());
        assert_eq!(b.list(true).unwrap().len(), 2);
    }
}
