use std::sync::LazyLock;

use regex::Regex;

use crate::model::category::{CategoryDraft, CategoryId};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_ICON_LEN: usize = 50;

static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

/// Problems caught before anything is sent to the backend
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("category name must not be empty")]
    EmptyName,
    #[error("category name is {0} characters; the limit is {max}", max = MAX_NAME_LEN)]
    NameTooLong(usize),
    #[error("color must look like #RRGGBB, got '{0}'")]
    BadColor(String),
    #[error("icon is {0} characters; the limit is {max}", max = MAX_ICON_LEN)]
    IconTooLong(usize),
    #[error("parent category not found: {0}")]
    UnknownParent(CategoryId),
    #[error("a category cannot be its own parent")]
    SelfParent,
    #[error("cannot move a category under its own descendant {0}")]
    DescendantParent(CategoryId),
}

/// Whether a color string is `#` followed by six hex digits
pub fn is_valid_color(color: &str) -> bool {
    COLOR_RE.is_match(color)
}

/// Check a draft's fields, reporting the first problem found.
/// Expects a draft that has gone through [`CategoryDraft::normalized`].
pub fn validate_draft(draft: &CategoryDraft) -> Result<(), ValidationError> {
    let name_len = draft.name.chars().count();
    if name_len == 0 {
        return Err(ValidationError::EmptyName);
    }
    if name_len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong(name_len));
    }
    if let Some(color) = &draft.color
        && !is_valid_color(color)
    {
        return Err(ValidationError::BadColor(color.clone()));
    }
    if let Some(icon) = &draft.icon {
        let icon_len = icon.chars().count();
        if icon_len > MAX_ICON_LEN {
            return Err(ValidationError::IconTooLong(icon_len));
        }
    }
    Ok(())
}
