use serde::Serialize;

use crate::model::category::{CategoryId, FlatCategoryOption};
use crate::model::tree::CategoryTree;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CategoryJson {
    pub id: CategoryId,
    pub name: String,
    pub breadcrumb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub sort_order: i32,
    pub component_count: u64,
    /// This category plus everything below it
    pub total_components: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryJson>,
}

#[derive(Serialize)]
pub struct DeletedJson {
    pub deleted: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reassigned_to: Option<CategoryId>,
    pub components_moved: u64,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// JSON for the slot at `idx`; with `recursive`, its subtree too
pub fn category_to_json(tree: &CategoryTree, idx: usize, recursive: bool) -> CategoryJson {
    let slot = tree.slot(idx);
    let record = &slot.record;
    CategoryJson {
        id: record.id.clone(),
        name: record.name.clone(),
        breadcrumb: tree.breadcrumb_of(&record.id).unwrap_or_default(),
        description: record.description.clone(),
        parent_id: slot.parent.map(|p| tree.slot(p).record.id.clone()),
        color: record.color.clone(),
        icon: record.icon.clone(),
        sort_order: record.sort_order,
        component_count: record.component_count,
        total_components: tree.subtree_components(idx),
        children: if recursive {
            slot.children
                .iter()
                .map(|&c| category_to_json(tree, c, true))
                .collect()
        } else {
            Vec::new()
        },
    }
}

pub fn forest_to_json(tree: &CategoryTree) -> Vec<CategoryJson> {
    tree.roots()
        .iter()
        .map(|&idx| category_to_json(tree, idx, true))
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn count_label(tree: &CategoryTree, idx: usize) -> String {
    let own = tree.slot(idx).record.component_count;
    let total = tree.subtree_components(idx);
    if total == own {
        format!("{}", own)
    } else {
        format!("{}/{}", own, total)
    }
}

/// One line per category: name, id, and `own/total` component counts
pub fn format_category_line(tree: &CategoryTree, idx: usize) -> String {
    let record = &tree.slot(idx).record;
    format!("{} [{}] ({})", record.name, record.id, count_label(tree, idx))
}

/// Format the tree, children indented under their parents
pub fn format_tree(tree: &CategoryTree) -> Vec<String> {
    tree.preorder()
        .map(|idx| {
            let prefix = "  ".repeat(tree.slot(idx).depth);
            format!("{}{}", prefix, format_category_line(tree, idx))
        })
        .collect()
}

/// Format flattened options as `id  breadcrumb`
pub fn format_flat(options: &[FlatCategoryOption]) -> Vec<String> {
    let width = options
        .iter()
        .map(|o| o.id.as_str().len())
        .max()
        .unwrap_or(0);
    options
        .iter()
        .map(|o| format!("{:>width$}  {}", o.id.as_str(), o.breadcrumb, width = width))
        .collect()
}

/// Format detailed category view
pub fn format_category_detail(tree: &CategoryTree, idx: usize) -> Vec<String> {
    let slot = tree.slot(idx);
    let record = &slot.record;
    let mut lines = vec![format!("{} [{}]", record.name, record.id)];

    if let Some(path) = tree.breadcrumb_of(&record.id) {
        lines.push(format!("path: {}", path));
    }
    if let Some(description) = &record.description {
        lines.push(format!("description: {}", description));
    }
    if let Some(color) = &record.color {
        lines.push(format!("color: {}", color));
    }
    if let Some(icon) = &record.icon {
        lines.push(format!("icon: {}", icon));
    }
    lines.push(format!("sort order: {}", record.sort_order));

    let total = tree.subtree_components(idx);
    if total == record.component_count {
        lines.push(format!("components: {}", record.component_count));
    } else {
        lines.push(format!(
            "components: {} ({} including subcategories)",
            record.component_count, total
        ));
    }

    if !slot.children.is_empty() {
        lines.push(String::new());
        lines.push("subcategories:".to_string());
        for &child in &slot.children {
            lines.push(format!("  {}", format_category_line(tree, child)));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::CategoryNode;
    use crate::ops::flatten::flatten;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> CategoryTree {
        CategoryTree::from_forest(vec![
            CategoryNode::new(1, "Resistors")
                .with_components(4)
                .with_children(vec![
                    CategoryNode::new(2, "SMD").with_components(12),
                    CategoryNode::new(3, "Through-hole"),
                ]),
            CategoryNode::new(10, "Capacitors").with_description("All kinds"),
        ])
        .unwrap()
    }

    #[test]
    fn test_format_tree() {
        assert_eq!(
            format_tree(&sample_tree()),
            vec![
                "Resistors [1] (4/16)",
                "  SMD [2] (12)",
                "  Through-hole [3] (0)",
                "Capacitors [10] (0)",
            ]
        );
    }

    #[test]
    fn test_format_flat_aligns_ids() {
        let tree = sample_tree();
        assert_eq!(
            format_flat(&flatten(&tree)),
            vec![
                " 1  Resistors",
                " 2  Resistors > SMD",
                " 3  Resistors > Through-hole",
                "10  Capacitors",
            ]
        );
    }

    #[test]
    fn test_format_detail() {
        let tree = sample_tree();
        let lines = format_category_detail(&tree, tree.index_of(&CategoryId::from(1)).unwrap());
        assert_eq!(lines[0], "Resistors [1]");
        assert!(lines.contains(&"components: 4 (16 including subcategories)".to_string()));
        assert!(lines.contains(&"  SMD [2] (12)".to_string()));
    }

    #[test]
    fn test_json_nests_children() {
        let tree = sample_tree();
        let json = serde_json::to_value(forest_to_json(&tree)).unwrap();
        assert_eq!(json[0]["total_components"], 16);
        assert_eq!(json[0]["children"][0]["breadcrumb"], "Resistors > SMD");
        assert_eq!(json[1]["description"], "All kinds");
        assert!(json[1].get("children").is_none());
    }
}
