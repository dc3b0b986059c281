use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Separator between ancestor names in a breadcrumb
pub const BREADCRUMB_SEPARATOR: &str = " > ";

/// Opaque category identifier.
///
/// The backend may send ids as JSON numbers or strings. Both are kept as
/// text, and an id is written back in the form it arrived in. Ids typed
/// by the user have no known form; numeric-looking ones are written as
/// numbers. Equality and ordering only look at the text.
#[derive(Debug, Clone)]
pub struct CategoryId {
    text: String,
    form: IdForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdForm {
    Number,
    Text,
    Unknown,
}

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        CategoryId {
            text: id.into(),
            form: IdForm::Unknown,
        }
    }

    fn number(n: i64) -> Self {
        CategoryId {
            text: n.to_string(),
            form: IdForm::Number,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for CategoryId {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for CategoryId {}

impl Hash for CategoryId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialOrd for CategoryId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CategoryId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text.cmp(&other.text)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.text)
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        CategoryId::new(s)
    }
}

impl From<String> for CategoryId {
    fn from(s: String) -> Self {
        CategoryId::new(s)
    }
}

impl From<u64> for CategoryId {
    fn from(n: u64) -> Self {
        CategoryId {
            text: n.to_string(),
            form: IdForm::Number,
        }
    }
}

impl From<i32> for CategoryId {
    fn from(n: i32) -> Self {
        CategoryId::number(i64::from(n))
    }
}

impl Serialize for CategoryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let as_number = match self.form {
            IdForm::Text => None,
            IdForm::Number | IdForm::Unknown => self
                .text
                .parse::<i64>()
                .ok()
                .filter(|n| n.to_string() == self.text),
        };
        match as_number {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_str(&self.text),
        }
    }
}

impl<'de> Deserialize<'de> for CategoryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => CategoryId::number(n),
            RawId::Text(text) => CategoryId {
                text,
                form: IdForm::Text,
            },
        })
    }
}

/// A category as sent by the backend, with its children nested inside
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    /// `#RRGGBB`
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    /// Inventory items classified directly under this category
    #[serde(default)]
    pub component_count: u64,
    /// A missing or `null` children list is the same as an empty one
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<CategoryNode>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<CategoryNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<CategoryNode>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CategoryNode {
    /// A root-level leaf with no components
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        CategoryNode {
            id: id.into(),
            name: name.into(),
            description: None,
            parent_id: None,
            color: None,
            icon: None,
            sort_order: 0,
            component_count: 0,
            children: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_components(mut self, count: u64) -> Self {
        self.component_count = count;
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Attach children, pointing their `parent_id` at this node
    pub fn with_children(mut self, children: Vec<CategoryNode>) -> Self {
        let parent = self.id.clone();
        self.children = children
            .into_iter()
            .map(|mut child| {
                child.parent_id = Some(parent.clone());
                child
            })
            .collect();
        self
    }
}

/// Stable-sort every sibling list by `sort_order`, recursively
pub fn sort_siblings(forest: &mut [CategoryNode]) {
    forest.sort_by_key(|node| node.sort_order);
    for node in forest.iter_mut() {
        sort_siblings(&mut node.children);
    }
}

/// One entry of the flattened, breadcrumb-indexed view of the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatCategoryOption {
    pub id: CategoryId,
    pub name: String,
    /// Ancestor names from the root down to this node, joined by ` > `
    pub breadcrumb: String,
    /// 0 for roots
    pub depth: usize,
}

/// Body of a create or update call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sort_order: i32,
}

impl CategoryDraft {
    pub fn named(name: impl Into<String>) -> Self {
        CategoryDraft {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Trim text fields and turn blank optional fields into `None`
    pub fn normalized(&self) -> CategoryDraft {
        fn blank_to_none(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        CategoryDraft {
            name: self.name.trim().to_string(),
            description: blank_to_none(&self.description),
            parent_id: self.parent_id.clone(),
            color: blank_to_none(&self.color),
            icon: blank_to_none(&self.icon),
            sort_order: self.sort_order,
        }
    }
}
