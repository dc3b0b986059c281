use crate::io::backend::{BackendError, CategoryBackend, DeleteRequest};
use crate::model::category::{CategoryDraft, CategoryId, CategoryNode, sort_siblings};
use crate::model::tree::{CategoryTree, TreeError};
use crate::ops::parents::validate_parent;
use crate::ops::validate::{ValidationError, validate_draft};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Backend(#[from] BackendError),
    #[error("{0}")]
    Tree(#[from] TreeError),
}

impl SessionError {
    /// Notification text; `fallback` covers backend errors without a message
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            SessionError::Backend(err) => err.user_message(fallback),
            other => other.to_string(),
        }
    }
}

/// The backend plus the last tree snapshot fetched from it.
///
/// Every successful mutation is followed by a full reload; the snapshot is
/// replaced wholesale, never patched. If that reload fails the old
/// snapshot stays and the session is marked stale.
pub struct CategorySession {
    backend: Box<dyn CategoryBackend>,
    tree: CategoryTree,
    include_empty: bool,
    stale: bool,
}

impl CategorySession {
    /// A session with an empty snapshot; call [`reload`](Self::reload) next
    pub fn new(backend: Box<dyn CategoryBackend>, include_empty: bool) -> Self {
        CategorySession {
            backend,
            tree: CategoryTree::default(),
            include_empty,
            stale: true,
        }
    }

    /// Create a session and fetch the first snapshot
    pub fn open(backend: Box<dyn CategoryBackend>, include_empty: bool) -> Result<Self, SessionError> {
        let mut session = CategorySession::new(backend, include_empty);
        session.reload()?;
        Ok(session)
    }

    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    pub fn backend(&self) -> &dyn CategoryBackend {
        self.backend.as_ref()
    }

    pub fn include_empty(&self) -> bool {
        self.include_empty
    }

    pub fn set_include_empty(&mut self, include_empty: bool) {
        self.include_empty = include_empty;
    }

    /// Whether the snapshot may lag behind the backend
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Re-fetch the whole forest and swap it in
    pub fn reload(&mut self) -> Result<(), SessionError> {
        let mut forest = self.backend.list(self.include_empty)?;
        sort_siblings(&mut forest);
        let tree = CategoryTree::from_forest(forest)?;
        tracing::debug!(categories = tree.len(), "category tree reloaded");
        self.tree = tree;
        self.stale = false;
        Ok(())
    }

    fn reload_after_mutation(&mut self) {
        if let Err(e) = self.reload() {
            tracing::warn!(error = %e, "reload after mutation failed; tree is stale");
            self.stale = true;
        }
    }

    pub fn create(&mut self, draft: &CategoryDraft) -> Result<CategoryNode, SessionError> {
        let draft = draft.normalized();
        validate_draft(&draft)?;
        validate_parent(&self.tree, None, draft.parent_id.as_ref())?;
        let created = self.backend.create(&draft).inspect_err(log_backend_error)?;
        tracing::info!(id = %created.id, name = %created.name, "category created");
        self.reload_after_mutation();
        Ok(created)
    }

    pub fn update(&mut self, id: &CategoryId, draft: &CategoryDraft) -> Result<CategoryNode, SessionError> {
        let draft = draft.normalized();
        validate_draft(&draft)?;
        validate_parent(&self.tree, Some(id), draft.parent_id.as_ref())?;
        let updated = self.backend.update(id, &draft).inspect_err(log_backend_error)?;
        tracing::info!(id = %updated.id, name = %updated.name, "category updated");
        self.reload_after_mutation();
        Ok(updated)
    }

    /// Send a delete as-is; the coordinator decides `force`/`reassign_to`
    pub fn delete(&mut self, request: &DeleteRequest) -> Result<(), SessionError> {
        self.backend.delete(request).inspect_err(log_backend_error)?;
        tracing::info!(
            id = %request.id,
            reassign_to = request.reassign_to.as_ref().map(CategoryId::as_str),
            "category deleted"
        );
        self.reload_after_mutation();
        Ok(())
    }
}

fn log_backend_error(err: &BackendError) {
    tracing::warn!(error = %err, detail = err.detail(), "backend call failed");
}
