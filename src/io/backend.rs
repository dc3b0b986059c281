use std::rc::Rc;

use serde_json::Value;

use crate::model::category::{CategoryDraft, CategoryId, CategoryNode};

/// Failure reported by (or while talking to) the inventory backend
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BackendError {
    /// 409: a sibling already has this name
    #[error("{0}")]
    Conflict(String),
    /// 422: the backend refused the payload
    #[error("invalid data provided")]
    Invalid { detail: Option<String> },
    /// Any other non-success status
    #[error("backend returned HTTP {status}{}", status_suffix(.message))]
    Status { status: u16, message: Option<String> },
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response from backend: {0}")]
    Decode(String),
}

fn status_suffix(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl BackendError {
    /// Classify a non-success response by status code and body
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            409 => BackendError::Conflict(
                message.unwrap_or_else(|| "a category with this name already exists".to_string()),
            ),
            422 => BackendError::Invalid { detail: message },
            _ => BackendError::Status { status, message },
        }
    }

    /// Whatever the backend said, verbatim, if anything
    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::Conflict(message) => Some(message),
            BackendError::Invalid { detail } | BackendError::Status { message: detail, .. } => {
                detail.as_deref()
            }
            BackendError::Transport(_) | BackendError::Decode(_) => None,
        }
    }

    /// Text for a user-facing notification. `fallback` is used when the
    /// backend gave no readable message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            BackendError::Conflict(message) => message.clone(),
            BackendError::Invalid { .. } => "invalid data provided".to_string(),
            BackendError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            BackendError::Status { message: None, .. } => fallback.to_string(),
            BackendError::Transport(message) | BackendError::Decode(message) => {
                if message.is_empty() {
                    fallback.to_string()
                } else {
                    message.clone()
                }
            }
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `detail`, `message`, then `error`, taking the first that is a
/// non-empty string. Structured validation details (arrays) are skipped.
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "message", "error"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Parameters of a `DELETE /categories/{id}` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub id: CategoryId,
    pub force: bool,
    pub reassign_to: Option<CategoryId>,
}

impl DeleteRequest {
    pub fn plain(id: CategoryId) -> Self {
        DeleteRequest {
            id,
            force: false,
            reassign_to: None,
        }
    }

    pub fn reassigning(id: CategoryId, target: CategoryId) -> Self {
        DeleteRequest {
            id,
            force: true,
            reassign_to: Some(target),
        }
    }
}

/// The category endpoints of the inventory API
pub trait CategoryBackend {
    /// `GET /categories?hierarchy=true&include_empty=<bool>`
    fn list(&self, include_empty: bool) -> Result<Vec<CategoryNode>, BackendError>;
    /// `POST /categories`
    fn create(&self, draft: &CategoryDraft) -> Result<CategoryNode, BackendError>;
    /// `PUT /categories/{id}`
    fn update(&self, id: &CategoryId, draft: &CategoryDraft) -> Result<CategoryNode, BackendError>;
    /// `DELETE /categories/{id}?force=<bool>&reassign_to=<id>`
    fn delete(&self, request: &DeleteRequest) -> Result<(), BackendError>;
}

impl<B: CategoryBackend + ?Sized> CategoryBackend for Rc<B> {
    fn list(&self, include_empty: bool) -> Result<Vec<CategoryNode>, BackendError> {
        (**self).list(include_empty)
    }

    fn create(&self, draft: &CategoryDraft) -> Result<CategoryNode, BackendError> {
        (**self).create(draft)
    }

    fn update(&self, id: &CategoryId, draft: &CategoryDraft) -> Result<CategoryNode, BackendError> {
        (**self).update(id, draft)
    }

    fn delete(&self, request: &DeleteRequest) -> Result<(), BackendError> {
        (**self).delete(request)
    }
}
