use crate::io::backend::BackendError;
use crate::model::category::{CategoryDraft, CategoryId, CategoryNode, FlatCategoryOption};
use crate::model::tree::CategoryTree;
use crate::ops::parents::{parent_options, validate_parent};
use crate::ops::session::{CategorySession, SessionError};
use crate::ops::validate::{ValidationError, validate_draft};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(CategoryId),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("a save is already in progress")]
    Busy,
    #[error("{0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    Saved(CategoryNode),
    Failed(String),
}

/// Create/edit form state for one category
#[derive(Debug, Clone)]
pub struct CategoryEditor {
    mode: EditorMode,
    pub draft: CategoryDraft,
    saving: bool,
    error: Option<String>,
}

impl CategoryEditor {
    /// A blank form, optionally preselecting a parent
    pub fn create(parent: Option<CategoryId>) -> Self {
        CategoryEditor {
            mode: EditorMode::Create,
            draft: CategoryDraft {
                parent_id: parent,
                ..Default::default()
            },
            saving: false,
            error: None,
        }
    }

    /// A form prefilled from an existing category. The parent comes from
    /// the node's place in the tree, not from its `parent_id` field.
    pub fn edit(tree: &CategoryTree, id: &CategoryId) -> Option<Self> {
        let record = tree.get(id)?;
        Some(CategoryEditor {
            mode: EditorMode::Edit(record.id.clone()),
            draft: CategoryDraft {
                name: record.name.clone(),
                description: record.description.clone(),
                parent_id: tree.parent_id_of(id),
                color: record.color.clone(),
                icon: record.icon.clone(),
                sort_order: record.sort_order,
            },
            saving: false,
            error: None,
        })
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn editing(&self) -> Option<&CategoryId> {
        match &self.mode {
            EditorMode::Create => None,
            EditorMode::Edit(id) => Some(id),
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn fallback_message(&self) -> &'static str {
        match self.mode {
            EditorMode::Create => "Failed to create category",
            EditorMode::Edit(_) => "Failed to update category",
        }
    }

    /// Parents this form may pick from
    pub fn parent_options(&self, tree: &CategoryTree) -> Vec<FlatCategoryOption> {
        parent_options(tree, self.editing())
    }

    /// Validate the form and mark it as saving. Returns the normalized
    /// draft to send.
    pub fn begin_submit(&mut self, tree: &CategoryTree) -> Result<CategoryDraft, EditorError> {
        if self.saving {
            return Err(EditorError::Busy);
        }
        let draft = self.draft.normalized();
        let checked = validate_draft(&draft)
            .and_then(|()| validate_parent(tree, self.editing(), draft.parent_id.as_ref()));
        if let Err(err) = checked {
            self.error = Some(err.to_string());
            return Err(err.into());
        }
        self.saving = true;
        self.error = None;
        Ok(draft)
    }

    pub fn finish(&mut self, result: Result<CategoryNode, BackendError>) -> EditorOutcome {
        self.saving = false;
        match result {
            Ok(node) => EditorOutcome::Saved(node),
            Err(err) => self.fail(err.user_message(self.fallback_message())),
        }
    }

    fn fail(&mut self, message: String) -> EditorOutcome {
        self.saving = false;
        self.error = Some(message.clone());
        EditorOutcome::Failed(message)
    }

    pub fn submit(&mut self, session: &mut CategorySession) -> Result<EditorOutcome, EditorError> {
        let draft = self.begin_submit(session.tree())?;
        let result = match &self.mode {
            EditorMode::Create => session.create(&draft),
            EditorMode::Edit(id) => session.update(id, &draft),
        };
        Ok(match result {
            Ok(node) => self.finish(Ok(node)),
            Err(SessionError::Backend(err)) => self.finish(Err(err)),
            Err(other) => {
                let message = other.user_message(self.fallback_message());
                self.fail(message)
            }
        })
    }
}
