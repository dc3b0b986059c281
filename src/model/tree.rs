use indexmap::IndexMap;

use super::category::{BREADCRUMB_SEPARATOR, CategoryId, CategoryNode};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("duplicate category id in tree: {0}")]
    DuplicateId(CategoryId),
}

/// The fields of a category without its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub component_count: u64,
}

impl CategoryRecord {
    fn split(node: CategoryNode) -> (CategoryRecord, Vec<CategoryNode>) {
        let CategoryNode {
            id,
            name,
            description,
            parent_id,
            color,
            icon,
            sort_order,
            component_count,
            children,
        } = node;
        (
            CategoryRecord {
                id,
                name,
                description,
                parent_id,
                color,
                icon,
                sort_order,
                component_count,
            },
            children,
        )
    }

    fn to_node(&self, children: Vec<CategoryNode>) -> CategoryNode {
        CategoryNode {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            parent_id: self.parent_id.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
            sort_order: self.sort_order,
            component_count: self.component_count,
            children,
        }
    }
}

/// One arena slot: a record plus its position in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub record: CategoryRecord,
    pub parent: Option<usize>,
    /// Child slot indices, in display order
    pub children: Vec<usize>,
    /// 0 for roots
    pub depth: usize,
}

/// Arena-backed category forest.
///
/// Slots are stored in pre-order and indexed by id. The nesting is taken
/// from the `children` lists the backend sent; `parent_id` is carried
/// along but not used to place nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTree {
    slots: Vec<Slot>,
    roots: Vec<usize>,
    index: IndexMap<CategoryId, usize>,
}

impl CategoryTree {
    /// Build the arena from a nested forest
    pub fn from_forest(forest: Vec<CategoryNode>) -> Result<Self, TreeError> {
        let mut tree = CategoryTree::default();
        for node in forest {
            let idx = tree.insert(node, None, 0)?;
            tree.roots.push(idx);
        }
        Ok(tree)
    }

    fn insert(
        &mut self,
        node: CategoryNode,
        parent: Option<usize>,
        depth: usize,
    ) -> Result<usize, TreeError> {
        let (record, children) = CategoryRecord::split(node);
        if self.index.contains_key(&record.id) {
            return Err(TreeError::DuplicateId(record.id));
        }
        let idx = self.slots.len();
        self.index.insert(record.id.clone(), idx);
        self.slots.push(Slot {
            record,
            parent,
            children: Vec::new(),
            depth,
        });
        for child in children {
            let child_idx = self.insert(child, Some(idx), depth + 1)?;
            self.slots[idx].children.push(child_idx);
        }
        Ok(idx)
    }

    /// Rebuild the nested forest
    pub fn to_forest(&self) -> Vec<CategoryNode> {
        self.roots.iter().map(|&idx| self.node_at(idx)).collect()
    }

    fn node_at(&self, idx: usize) -> CategoryNode {
        let slot = &self.slots[idx];
        let children = slot.children.iter().map(|&c| self.node_at(c)).collect();
        slot.record.to_node(children)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn slot(&self, idx: usize) -> &Slot {
        &self.slots[idx]
    }

    pub fn index_of(&self, id: &CategoryId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &CategoryId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &CategoryId) -> Option<&CategoryRecord> {
        self.index_of(id).map(|idx| &self.slots[idx].record)
    }

    /// The tree's own copy of `id`, which carries the form the backend
    /// sent it in. Unknown ids come back unchanged.
    pub fn canonical_id(&self, id: CategoryId) -> CategoryId {
        match self.get(&id) {
            Some(record) => record.id.clone(),
            None => id,
        }
    }

    /// Id of the node's parent as placed in the tree, `None` for roots
    pub fn parent_id_of(&self, id: &CategoryId) -> Option<CategoryId> {
        let parent = self.slots[self.index_of(id)?].parent?;
        Some(self.slots[parent].record.id.clone())
    }

    /// Slot indices in pre-order
    pub fn preorder(&self) -> impl Iterator<Item = usize> + '_ {
        self.index.values().copied()
    }

    /// All slot indices strictly below `idx`, in pre-order
    pub fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_descendants(idx, &mut out);
        out
    }

    fn collect_descendants(&self, idx: usize, out: &mut Vec<usize>) {
        for &child in &self.slots[idx].children {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    /// Whether `idx` is `ancestor` itself or lies somewhere below it
    pub fn is_within(&self, ancestor: usize, idx: usize) -> bool {
        let mut current = Some(idx);
        while let Some(i) = current {
            if i == ancestor {
                return true;
            }
            current = self.slots[i].parent;
        }
        false
    }

    /// Breadcrumb for a single node, walking the parent chain
    pub fn breadcrumb_of(&self, id: &CategoryId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self.index_of(id);
        while let Some(i) = current {
            names.push(self.slots[i].record.name.as_str());
            current = self.slots[i].parent;
        }
        if names.is_empty() {
            return None;
        }
        names.reverse();
        Some(names.join(BREADCRUMB_SEPARATOR))
    }

    /// Components under `idx` and all of its descendants
    pub fn subtree_components(&self, idx: usize) -> u64 {
        self.slots[idx].record.component_count
            + self.slots[idx]
                .children
                .iter()
                .map(|&c| self.subtree_components(c))
                .sum::<u64>()
    }

    pub fn total_components(&self) -> u64 {
        self.slots.iter().map(|s| s.record.component_count).sum()
    }

    /// Build a new tree with just the slots marked in `keep`.
    ///
    /// A kept slot whose parent is dropped is dropped too, so `keep` must
    /// be closed over ancestors for every node meant to survive.
    pub fn retain(&self, keep: &[bool]) -> CategoryTree {
        let mut tree = CategoryTree::default();
        for &root in &self.roots {
            if keep[root] {
                let idx = tree.copy_kept(self, root, keep, None);
                tree.roots.push(idx);
            }
        }
        tree
    }

    fn copy_kept(
        &mut self,
        source: &CategoryTree,
        src_idx: usize,
        keep: &[bool],
        parent: Option<usize>,
    ) -> usize {
        let src = &source.slots[src_idx];
        let idx = self.slots.len();
        self.index.insert(src.record.id.clone(), idx);
        self.slots.push(Slot {
            record: src.record.clone(),
            parent,
            children: Vec::new(),
            depth: src.depth,
        });
        for &child in &src.children {
            if keep[child] {
                let child_idx = self.copy_kept(source, child, keep, Some(idx));
                self.slots[idx].children.push(child_idx);
            }
        }
        idx
    }
}
