//! Domain entities: board and forest snapshots

use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::arena::ForestIndex;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::id::uid;

// ============================================================
// KANBAN
// ============================================================

/// A single kanban card. Owned by exactly one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub title: String,
}

impl Card {
    /// Create a card with a freshly generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(uid(), title)
    }

    pub fn with_id(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A board column. The set of columns is fixed; only `cards` changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    /// Accent color, `#RRGGBB`
    pub color: String,
    /// Ordered cards, top to bottom
    pub cards: Vec<Card>,
}

impl Column {
    pub fn new(id: impl Into<String>, title: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            color: color.into(),
            cards: Vec::new(),
        }
    }

    pub fn with_cards(mut self, cards: Vec<Card>) -> Self {
        self.cards = cards;
        self
    }

    /// Index of a card within this column.
    pub fn position_of(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }
}

/// Immutable board snapshot.
///
/// Columns are reference counted: a transition clones the board (cheap),
/// then copies-on-write only the columns it touches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    pub columns: Vec<Arc<Column>>,
}

impl Board {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns: columns.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.id == column_id)
            .map(|c| c.as_ref())
    }

    pub(crate) fn column_index(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column_id)
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    /// Every card id appears in exactly one column, exactly once.
    pub fn validate(&self) -> DomainResult<()> {
        match self
            .columns
            .iter()
            .flat_map(|c| c.cards.iter().map(|card| card.id.as_str()))
            .duplicates()
            .next()
        {
            Some(id) => Err(DomainError::DuplicateId(id.to_string())),
            None => Ok(()),
        }
    }
}

// ============================================================
// TREE
// ============================================================

/// A node in the lazily loaded forest.
///
/// Children are shared by `Arc` between snapshots; a subtree that a
/// transition does not touch is never rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<Arc<TreeNode>>,
    /// `false` until the children have been fetched once
    #[serde(default)]
    pub loaded: bool,
    #[serde(default)]
    pub expanded: bool,
    /// A child fetch is in flight
    #[serde(default)]
    pub loading: bool,
}

impl TreeNode {
    /// A node whose (empty) children are already known.
    pub fn leaf(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
            loaded: true,
            expanded: false,
            loading: false,
        }
    }

    /// A node whose children must be fetched before first expansion.
    pub fn lazy(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            loaded: false,
            ..Self::leaf(id, name)
        }
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children.into_iter().map(Arc::new).collect();
        self
    }

    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Copy of this node's fields with a replacement child list.
    pub(crate) fn with_shared_children(&self, children: Vec<Arc<TreeNode>>) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            children,
            loaded: self.loaded,
            expanded: self.expanded,
            loading: self.loading,
        }
    }

    pub fn state(&self) -> NodeState {
        if self.loading {
            NodeState::Loading
        } else if !self.loaded {
            NodeState::CollapsedUnloaded
        } else if self.expanded {
            NodeState::ExpandedLoaded
        } else {
            NodeState::CollapsedLoaded
        }
    }

    /// Whether children should be rendered below this node.
    pub fn shows_children(&self) -> bool {
        self.expanded && !self.children.is_empty()
    }
}

/// Expand/collapse state of a node, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeState {
    CollapsedUnloaded,
    Loading,
    CollapsedLoaded,
    ExpandedLoaded,
}

/// Child record as delivered by a child source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSpec {
    pub id: String,
    pub name: String,
    /// Child has children of its own that must be fetched lazily
    #[serde(default)]
    pub expandable: bool,
}

impl ChildSpec {
    pub fn leaf(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            expandable: false,
        }
    }

    pub fn expandable(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            expandable: true,
            ..Self::leaf(id, name)
        }
    }

    pub fn into_node(self) -> TreeNode {
        if self.expandable {
            TreeNode::lazy(self.id, self.name)
        } else {
            TreeNode::leaf(self.id, self.name)
        }
    }
}

/// Immutable forest snapshot: ordered roots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Forest {
    pub roots: Vec<Arc<TreeNode>>,
}

impl Forest {
    pub fn new(roots: Vec<TreeNode>) -> Self {
        Self {
            roots: roots.into_iter().map(Arc::new).collect(),
        }
    }

    pub(crate) fn from_shared(roots: Vec<Arc<TreeNode>>) -> Self {
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Every node id is unique across the forest.
    pub fn validate(&self) -> DomainResult<()> {
        ForestIndex::build(self).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_flags_when_deriving_state_then_matches_machine() {
        let lazy = TreeNode::lazy("a", "A");
        assert_eq!(lazy.state(), NodeState::CollapsedUnloaded);

        let loading = TreeNode {
            loading: true,
            ..TreeNode::lazy("a", "A")
        };
        assert_eq!(loading.state(), NodeState::Loading);

        let leaf = TreeNode::leaf("b", "B");
        assert_eq!(leaf.state(), NodeState::CollapsedLoaded);
        assert_eq!(leaf.with_expanded(true).state(), NodeState::ExpandedLoaded);
    }

    #[test]
    fn given_duplicate_card_when_validating_board_then_reports_id() {
        let board = Board::new(vec![
            Column::new("a", "A", "#000000").with_cards(vec![Card::with_id("x", "X")]),
            Column::new("b", "B", "#000000").with_cards(vec![Card::with_id("x", "X again")]),
        ]);
        assert_eq!(board.validate(), Err(DomainError::DuplicateId("x".into())));
    }

    #[test]
    fn given_expandable_spec_when_converting_then_node_is_lazy() {
        assert!(!ChildSpec::expandable("1", "One").into_node().loaded);
        assert!(ChildSpec::leaf("2", "Two").into_node().loaded);
    }
}
