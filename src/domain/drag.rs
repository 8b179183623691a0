//! Drag-and-drop sessions for the kanban board.
//!
//! A session is a plain value: created when a card is grabbed, consumed by
//! a drop or a cancel. Hovering only produces feedback for rendering.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::entities::Board;
use crate::domain::kanban::move_card;

/// Payload carried from drag start until drop or cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragSession {
    pub source_column_id: String,
    pub card_id: String,
}

/// Where a dragged card is released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropTarget {
    /// Column body: append to the end
    Column { column_id: String },
    /// Another card: insert before it
    Card { column_id: String, card_id: String },
}

impl DropTarget {
    pub fn column(column_id: impl Into<String>) -> Self {
        Self::Column {
            column_id: column_id.into(),
        }
    }

    pub fn card(column_id: impl Into<String>, card_id: impl Into<String>) -> Self {
        Self::Card {
            column_id: column_id.into(),
            card_id: card_id.into(),
        }
    }

    pub fn column_id(&self) -> &str {
        match self {
            Self::Column { column_id } | Self::Card { column_id, .. } => column_id.as_str(),
        }
    }

    fn card_id(&self) -> Option<&str> {
        match self {
            Self::Column { .. } => None,
            Self::Card { card_id, .. } => Some(card_id.as_str()),
        }
    }
}

/// Transient hover highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverFeedback {
    /// Dropping here would move the card
    Accepts,
    /// Hovering the dragged card itself
    SelfTarget,
    /// Unknown column, or the dragged card no longer exists
    Invalid,
}

impl DragSession {
    pub fn start(source_column_id: impl Into<String>, card_id: impl Into<String>) -> Self {
        Self {
            source_column_id: source_column_id.into(),
            card_id: card_id.into(),
        }
    }

    /// Feedback for hovering over `target`. Never touches the board.
    pub fn hover(&self, board: &Board, target: &DropTarget) -> HoverFeedback {
        if target.column_id() == self.source_column_id
            && target.card_id() == Some(self.card_id.as_str())
        {
            return HoverFeedback::SelfTarget;
        }
        let source_has_card = board
            .column(&self.source_column_id)
            .and_then(|c| c.position_of(&self.card_id))
            .is_some();
        if source_has_card && board.column(target.column_id()).is_some() {
            HoverFeedback::Accepts
        } else {
            HoverFeedback::Invalid
        }
    }

    /// Release the card over `target`.
    pub fn drop_on(self, board: &Board, target: &DropTarget) -> Board {
        debug!("drop {} on {:?}", self.card_id, target);
        move_card(
            board,
            &self.source_column_id,
            &self.card_id,
            target.column_id(),
            target.card_id(),
        )
    }

    /// Abandon the drag. The board is not involved.
    pub fn cancel(self) {
        debug!("drag of {} cancelled", self.card_id);
    }
}
