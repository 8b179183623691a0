use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Forest, NodeState, TreeNode};
use crate::domain::error::{DomainError, DomainResult};

/// Flattened copy of one forest node.
#[derive(Debug, Clone)]
pub struct IndexedNode {
    pub id: String,
    pub name: String,
    pub state: NodeState,
    /// Children are rendered below this node
    pub open: bool,
    /// Index of parent node in the arena, None for roots
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena
    pub children: Vec<Index>,
}

/// One line of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub id: String,
    pub name: String,
    pub depth: usize,
    pub state: NodeState,
    pub child_count: usize,
}

/// Arena + id map view of a forest snapshot.
///
/// Built once per snapshot for O(1) lookups by id, parent navigation and
/// flattened rendering. The snapshot itself stays the source of truth.
#[derive(Debug, Default)]
pub struct ForestIndex {
    arena: Arena<IndexedNode>,
    roots: Vec<Index>,
    by_id: HashMap<String, Index>,
}

impl ForestIndex {
    /// Index a snapshot. Fails on the first repeated id.
    #[instrument(level = "debug", skip(forest))]
    pub fn build(forest: &Forest) -> DomainResult<Self> {
        let mut index = Self::default();
        for root in &forest.roots {
            let idx = index.insert(root, None)?;
            index.roots.push(idx);
        }
        Ok(index)
    }

    fn insert(&mut self, node: &TreeNode, parent: Option<Index>) -> DomainResult<Index> {
        if self.by_id.contains_key(&node.id) {
            return Err(DomainError::DuplicateId(node.id.clone()));
        }
        let idx = self.arena.insert(IndexedNode {
            id: node.id.clone(),
            name: node.name.clone(),
            state: node.state(),
            open: node.shows_children(),
            parent,
            children: Vec::with_capacity(node.children.len()),
        });
        self.by_id.insert(node.id.clone(), idx);

        for child in &node.children {
            let child_idx = self.insert(child, Some(idx))?;
            if let Some(entry) = self.arena.get_mut(idx) {
                entry.children.push(child_idx);
            }
        }
        Ok(idx)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&IndexedNode> {
        self.by_id.get(id).and_then(|&idx| self.arena.get(idx))
    }

    pub fn parent_id(&self, id: &str) -> Option<&str> {
        let parent = self.get(id)?.parent?;
        self.arena.get(parent).map(|p| p.id.as_str())
    }

    /// Ids from the root down to `id`, inclusive. Empty if unknown.
    pub fn path_to(&self, id: &str) -> Vec<&str> {
        let mut path = Vec::new();
        let mut cursor = self.by_id.get(id).copied();
        while let Some(idx) = cursor {
            match self.arena.get(idx) {
                Some(node) => {
                    path.push(node.id.as_str());
                    cursor = node.parent;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Number of levels in the deepest tree, 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, idx: Index) -> usize {
        if let Some(node) = self.arena.get(idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Ids of nodes without (known) children, left to right.
    pub fn leaf_ids(&self) -> Vec<&str> {
        self.iter()
            .filter(|node| node.children.is_empty())
            .map(|node| node.id.as_str())
            .collect()
    }

    /// Preorder traversal over all nodes, expanded or not.
    pub fn iter(&self) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self)
    }

    /// Rows a tree view shows: preorder, skipping the children of nodes
    /// that are collapsed.
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<(Index, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();
        while let Some((idx, depth)) = stack.pop() {
            let Some(node) = self.arena.get(idx) else {
                continue;
            };
            rows.push(VisibleRow {
                id: node.id.clone(),
                name: node.name.clone(),
                depth,
                state: node.state,
                child_count: node.children.len(),
            });
            if node.open {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    stack.push((child, depth + 1));
                }
            }
        }
        rows
    }
}

pub struct PreOrderIterator<'a> {
    index: &'a ForestIndex,
    stack: Vec<Index>,
}

impl<'a> PreOrderIterator<'a> {
    fn new(index: &'a ForestIndex) -> Self {
        Self {
            index,
            stack: index.roots.iter().rev().copied().collect(),
        }
    }
}

impl<'a> Iterator for PreOrderIterator<'a> {
    type Item = &'a IndexedNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.index.arena.get(current) {
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some(node);
            }
        }
        None
    }
}
