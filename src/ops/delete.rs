use crate::io::backend::{BackendError, DeleteRequest};
use crate::model::category::{CategoryId, FlatCategoryOption};
use crate::model::tree::CategoryTree;
use crate::ops::parents::reassignment_targets;
use crate::ops::session::{CategorySession, SessionError};

/// Shown when the backend error carries no message of its own
pub const DELETE_FALLBACK_MESSAGE: &str = "Failed to delete category";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    Idle,
    Confirming,
    Submitting,
}

/// The category a confirmation dialog is open for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub id: CategoryId,
    pub name: String,
    pub breadcrumb: String,
    pub component_count: u64,
    pub child_count: usize,
}

impl DeleteTarget {
    /// Components must be moved somewhere before the node can go
    pub fn needs_reassignment(&self) -> bool {
        self.component_count > 0
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeleteError {
    #[error("no delete is awaiting confirmation")]
    NotConfirming,
    #[error("a delete is already in progress")]
    Busy,
    #[error("category not found: {0}")]
    UnknownCategory(CategoryId),
    #[error("cannot move components to {0}")]
    InvalidTarget(CategoryId),
    #[error("choose where to move the {count} components first")]
    TargetRequired { count: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(CategoryId),
    /// The dialog stays open with this message
    Failed(String),
}

/// Confirmation dialog for deleting one category.
///
/// `Idle -> Confirming` on [`request`](Self::request),
/// `Confirming -> Submitting` on [`begin_submit`](Self::begin_submit), then
/// back to `Idle` on success or to `Confirming` (error kept, target kept)
/// on failure. [`cancel`](Self::cancel) closes it from `Confirming`.
#[derive(Debug, Clone)]
pub struct DeleteDialog {
    phase: DeletePhase,
    target: Option<DeleteTarget>,
    reassign_to: Option<CategoryId>,
    error: Option<String>,
}

impl Default for DeleteDialog {
    fn default() -> Self {
        DeleteDialog::new()
    }
}

impl DeleteDialog {
    pub fn new() -> Self {
        DeleteDialog {
            phase: DeletePhase::Idle,
            target: None,
            reassign_to: None,
            error: None,
        }
    }

    pub fn phase(&self) -> DeletePhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != DeletePhase::Idle
    }

    pub fn target(&self) -> Option<&DeleteTarget> {
        self.target.as_ref()
    }

    pub fn reassign_to(&self) -> Option<&CategoryId> {
        self.reassign_to.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Open the dialog for `id`. Any half-finished dialog is replaced
    /// unless a submission is in flight.
    pub fn request(&mut self, tree: &CategoryTree, id: &CategoryId) -> Result<(), DeleteError> {
        if self.phase == DeletePhase::Submitting {
            return Err(DeleteError::Busy);
        }
        let idx = tree
            .index_of(id)
            .ok_or_else(|| DeleteError::UnknownCategory(id.clone()))?;
        let slot = tree.slot(idx);
        self.target = Some(DeleteTarget {
            id: id.clone(),
            name: slot.record.name.clone(),
            breadcrumb: tree.breadcrumb_of(id).unwrap_or_default(),
            component_count: slot.record.component_count,
            child_count: slot.children.len(),
        });
        self.reassign_to = None;
        self.error = None;
        self.phase = DeletePhase::Confirming;
        Ok(())
    }

    /// Categories the components may be moved to; empty when idle
    pub fn targets(&self, tree: &CategoryTree) -> Vec<FlatCategoryOption> {
        match &self.target {
            Some(target) => reassignment_targets(tree, &target.id),
            None => Vec::new(),
        }
    }

    pub fn choose_target(&mut self, tree: &CategoryTree, id: &CategoryId) -> Result<(), DeleteError> {
        if self.phase != DeletePhase::Confirming {
            return Err(if self.phase == DeletePhase::Submitting {
                DeleteError::Busy
            } else {
                DeleteError::NotConfirming
            });
        }
        let Some(target) = &self.target else {
            return Err(DeleteError::NotConfirming);
        };
        if &target.id == id || !tree.contains(id) {
            return Err(DeleteError::InvalidTarget(id.clone()));
        }
        self.reassign_to = Some(id.clone());
        Ok(())
    }

    pub fn clear_target(&mut self) {
        if self.phase == DeletePhase::Confirming {
            self.reassign_to = None;
        }
    }

    /// Whether the confirm action is enabled
    pub fn can_confirm(&self) -> bool {
        match (&self.phase, &self.target) {
            (DeletePhase::Confirming, Some(target)) => {
                !target.needs_reassignment() || self.reassign_to.is_some()
            }
            _ => false,
        }
    }

    /// Move to `Submitting` and build the request to send. Components are
    /// moved with `force=true&reassign_to=..`; a node without components is
    /// deleted plainly.
    pub fn begin_submit(&mut self) -> Result<DeleteRequest, DeleteError> {
        match self.phase {
            DeletePhase::Submitting => return Err(DeleteError::Busy),
            DeletePhase::Idle => return Err(DeleteError::NotConfirming),
            DeletePhase::Confirming => {}
        }
        let target = self.target.as_ref().ok_or(DeleteError::NotConfirming)?;
        let request = if target.needs_reassignment() {
            let reassign_to = self.reassign_to.clone().ok_or(DeleteError::TargetRequired {
                count: target.component_count,
            })?;
            DeleteRequest::reassigning(target.id.clone(), reassign_to)
        } else {
            DeleteRequest::plain(target.id.clone())
        };
        self.phase = DeletePhase::Submitting;
        self.error = None;
        Ok(request)
    }

    /// Settle a submission started by [`begin_submit`](Self::begin_submit)
    pub fn finish(&mut self, result: Result<(), BackendError>) -> DeleteOutcome {
        match result {
            Ok(()) => {
                let id = self
                    .target
                    .take()
                    .map(|target| target.id)
                    .unwrap_or_else(|| CategoryId::new(""));
                self.reset();
                DeleteOutcome::Deleted(id)
            }
            Err(err) => self.fail(err.user_message(DELETE_FALLBACK_MESSAGE)),
        }
    }

    fn fail(&mut self, message: String) -> DeleteOutcome {
        self.phase = DeletePhase::Confirming;
        self.error = Some(message.clone());
        DeleteOutcome::Failed(message)
    }

    /// Run the whole submission against `session`, reloading on success
    pub fn submit(&mut self, session: &mut CategorySession) -> Result<DeleteOutcome, DeleteError> {
        let request = self.begin_submit()?;
        tracing::debug!(id = %request.id, force = request.force, "submitting delete");
        let outcome = match session.delete(&request) {
            Ok(()) => self.finish(Ok(())),
            Err(SessionError::Backend(err)) => self.finish(Err(err)),
            Err(other) => self.fail(other.user_message(DELETE_FALLBACK_MESSAGE)),
        };
        Ok(outcome)
    }

    /// Close the dialog without deleting. Ignored while submitting.
    pub fn cancel(&mut self) -> bool {
        if self.phase == DeletePhase::Confirming {
            self.reset();
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.phase = DeletePhase::Idle;
        self.target = None;
        self.reassign_to = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::io::memory::MemoryBackend;
    use crate::model::category::CategoryNode;
    use pretty_assertions::assert_eq;

    fn id(n: i32) -> CategoryId {
        CategoryId::from(n)
    }

    fn forest() -> Vec<CategoryNode> {
        vec![
            CategoryNode::new(1, "Resistors")
                .with_components(3)
                .with_children(vec![CategoryNode::new(2, "SMD").with_components(3)]),
            CategoryNode::new(3, "Capacitors"),
        ]
    }

    fn tree() -> CategoryTree {
        CategoryTree::from_forest(forest()).unwrap()
    }

    fn open(backend: &Rc<MemoryBackend>) -> CategorySession {
        CategorySession::open(Box::new(Rc::clone(backend)), true).unwrap()
    }

    #[test]
    fn test_request_opens_confirming() {
        let mut dialog = DeleteDialog::new();
        assert_eq!(dialog.phase(), DeletePhase::Idle);
        dialog.request(&tree(), &id(1)).unwrap();
        assert_eq!(dialog.phase(), DeletePhase::Confirming);
        let target = dialog.target().unwrap();
        assert_eq!(target.name, "Resistors");
        assert_eq!(target.component_count, 3);
        assert_eq!(target.child_count, 1);
        assert_eq!(dialog.reassign_to(), None);
    }

    #[test]
    fn test_request_unknown_category() {
        let mut dialog = DeleteDialog::new();
        assert_eq!(
            dialog.request(&tree(), &id(99)),
            Err(DeleteError::UnknownCategory(id(99)))
        );
        assert_eq!(dialog.phase(), DeletePhase::Idle);
    }

    #[test]
    fn test_confirm_disabled_until_target_chosen() {
        let tree = tree();
        let mut dialog = DeleteDialog::new();
        dialog.request(&tree, &id(1)).unwrap();
        assert!(!dialog.can_confirm());
        assert_eq!(
            dialog.begin_submit(),
            Err(DeleteError::TargetRequired { count: 3 })
        );
        assert_eq!(dialog.phase(), DeletePhase::Confirming);

        dialog.choose_target(&tree, &id(2)).unwrap();
        assert!(dialog.can_confirm());
        dialog.clear_target();
        assert!(!dialog.can_confirm());
    }

    #[test]
    fn test_targets_never_offer_deleted_node() {
        let tree = tree();
        let mut dialog = DeleteDialog::new();
        assert!(dialog.targets(&tree).is_empty());
        dialog.request(&tree, &id(1)).unwrap();
        let ids: Vec<_> = dialog.targets(&tree).into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![id(2), id(3)]);
        assert_eq!(
            dialog.choose_target(&tree, &id(1)),
            Err(DeleteError::InvalidTarget(id(1)))
        );
        assert_eq!(
            dialog.choose_target(&tree, &id(42)),
            Err(DeleteError::InvalidTarget(id(42)))
        );
    }

    #[test]
    fn test_empty_category_deletes_plainly() {
        let tree = tree();
        let mut dialog = DeleteDialog::new();
        dialog.request(&tree, &id(3)).unwrap();
        assert!(dialog.can_confirm());
        assert_eq!(dialog.begin_submit(), Ok(DeleteRequest::plain(id(3))));
    }

    #[test]
    fn test_submitting_blocks_second_submit() {
        let tree = tree();
        let mut dialog = DeleteDialog::new();
        dialog.request(&tree, &id(3)).unwrap();
        dialog.begin_submit().unwrap();
        assert_eq!(dialog.phase(), DeletePhase::Submitting);
        assert!(!dialog.can_confirm());
        assert_eq!(dialog.begin_submit(), Err(DeleteError::Busy));
        assert_eq!(dialog.request(&tree, &id(1)), Err(DeleteError::Busy));
        assert!(!dialog.cancel());
    }

    #[test]
    fn test_finish_failure_keeps_dialog_open() {
        let tree = tree();
        let mut dialog = DeleteDialog::new();
        dialog.request(&tree, &id(1)).unwrap();
        dialog.choose_target(&tree, &id(3)).unwrap();
        dialog.begin_submit().unwrap();

        let outcome = dialog.finish(Err(BackendError::Status {
            status: 500,
            message: None,
        }));
        assert_eq!(outcome, DeleteOutcome::Failed(DELETE_FALLBACK_MESSAGE.into()));
        assert_eq!(dialog.phase(), DeletePhase::Confirming);
        assert_eq!(dialog.error(), Some(DELETE_FALLBACK_MESSAGE));
        assert_eq!(dialog.reassign_to(), Some(&id(3)));
    }

    #[test]
    fn test_finish_uses_backend_message() {
        let tree = tree();
        let mut dialog = DeleteDialog::new();
        dialog.request(&tree, &id(3)).unwrap();
        dialog.begin_submit().unwrap();
        let outcome = dialog.finish(Err(BackendError::from_status(
            400,
            r#"{"detail": "Category has subcategories"}"#,
        )));
        assert_eq!(outcome, DeleteOutcome::Failed("Category has subcategories".into()));
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let tree = tree();
        let mut dialog = DeleteDialog::new();
        dialog.request(&tree, &id(1)).unwrap();
        dialog.choose_target(&tree, &id(2)).unwrap();
        assert!(dialog.cancel());
        assert_eq!(dialog.phase(), DeletePhase::Idle);
        assert!(dialog.target().is_none());
        assert!(dialog.reassign_to().is_none());
        assert!(!dialog.cancel());
    }

    #[test]
    fn test_submit_sends_reassign_and_reloads() {
        let backend = Rc::new(MemoryBackend::from_forest(forest()));
        let mut session = open(&backend);
        let mut dialog = DeleteDialog::new();

        dialog.request(session.tree(), &id(1)).unwrap();
        assert!(!dialog.can_confirm());
        dialog.choose_target(session.tree(), &id(2)).unwrap();
        assert!(dialog.can_confirm());

        let outcome = dialog.submit(&mut session).unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted(id(1)));
        assert_eq!(dialog.phase(), DeletePhase::Idle);
        assert_eq!(
            backend.calls(),
            vec![
                "GET include_empty=true",
                "DELETE 1 force=true reassign_to=2",
                "GET include_empty=true",
            ]
        );
        // SMD now holds its own 3 plus the 3 moved from Resistors
        assert_eq!(session.tree().get(&id(2)).unwrap().component_count, 6);
        assert!(!session.tree().contains(&id(1)));
    }

    #[test]
    fn test_submit_without_target_sends_nothing() {
        let backend = Rc::new(MemoryBackend::from_forest(forest()));
        let mut session = open(&backend);
        let mut dialog = DeleteDialog::new();
        dialog.request(session.tree(), &id(1)).unwrap();
        assert_eq!(
            dialog.submit(&mut session),
            Err(DeleteError::TargetRequired { count: 3 })
        );
        assert_eq!(backend.calls(), vec!["GET include_empty=true"]);
    }

    #[test]
    fn test_submit_failure_surfaces_message() {
        let backend = Rc::new(MemoryBackend::from_forest(forest()));
        let mut session = open(&backend);
        backend.fail_next(BackendError::Transport("connection refused".into()));
        let mut dialog = DeleteDialog::new();
        dialog.request(session.tree(), &id(3)).unwrap();
        let outcome = dialog.submit(&mut session).unwrap();
        assert_eq!(outcome, DeleteOutcome::Failed("connection refused".into()));
        assert_eq!(dialog.phase(), DeletePhase::Confirming);
        assert!(session.tree().contains(&id(3)));
    }

    #[test]
    fn test_retry_after_failure_succeeds() {
        let backend = Rc::new(MemoryBackend::from_forest(forest()));
        let mut session = open(&backend);
        let mut dialog = DeleteDialog::new();
        dialog.request(session.tree(), &id(1)).unwrap();
        dialog.choose_target(session.tree(), &id(2)).unwrap();

        backend.fail_next(BackendError::Conflict("Category is locked".into()));
        let outcome = dialog.submit(&mut session).unwrap();
        assert_eq!(outcome, DeleteOutcome::Failed("Category is locked".into()));
        assert_eq!(dialog.phase(), DeletePhase::Confirming);
        assert!(dialog.can_confirm());

        let outcome = dialog.submit(&mut session).unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted(id(1)));
        assert_eq!(dialog.phase(), DeletePhase::Idle);
        assert_eq!(dialog.error(), None);
        assert_eq!(
            backend.calls(),
            vec![
                "GET include_empty=true",
                "DELETE 1 force=true reassign_to=2",
                "DELETE 1 force=true reassign_to=2",
                "GET include_empty=true",
            ]
        );
        assert_eq!(session.tree().get(&id(2)).unwrap().component_count, 6);
    }
}
