//! Kanban board service
//!
//! Holds the latest board snapshot and applies intents to it in order.

use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::domain::{kanban, normalize_label, Board, DragSession, DropTarget, HoverFeedback};

/// Service owning the current board.
#[derive(Debug, Clone)]
pub struct BoardService {
    board: Board,
}

impl BoardService {
    pub fn new(board: Board) -> Self {
        Self { board }
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> &Board {
        &self.board
    }

    fn commit(&mut self, next: Board, op: &str) -> bool {
        if next == self.board {
            debug!("{}: no change", op);
            return false;
        }
        self.board = next;
        true
    }

    /// Add a card to the end of a column.
    ///
    /// Returns the new card's id, or `None` when the column does not exist.
    #[instrument(level = "debug", skip(self))]
    pub fn add_card(&mut self, column_id: &str, title: &str) -> ApplicationResult<Option<String>> {
        let title = normalize_label("title", title)?;
        let next = kanban::add_card(&self.board, column_id, &title);
        if !self.commit(next, "add_card") {
            return Ok(None);
        }
        Ok(self
            .board
            .column(column_id)
            .and_then(|c| c.cards.last())
            .map(|c| c.id.clone()))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn rename_card(
        &mut self,
        column_id: &str,
        card_id: &str,
        title: &str,
    ) -> ApplicationResult<bool> {
        let title = normalize_label("title", title)?;
        let next = kanban::rename_card(&self.board, column_id, card_id, &title);
        Ok(self.commit(next, "rename_card"))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn delete_card(&mut self, column_id: &str, card_id: &str) -> bool {
        let next = kanban::delete_card(&self.board, column_id, card_id);
        self.commit(next, "delete_card")
    }

    #[instrument(level = "debug", skip(self))]
    pub fn move_card(
        &mut self,
        source_column_id: &str,
        card_id: &str,
        target_column_id: &str,
        target_card_id: Option<&str>,
    ) -> bool {
        let next = kanban::move_card(
            &self.board,
            source_column_id,
            card_id,
            target_column_id,
            target_card_id,
        );
        self.commit(next, "move_card")
    }

    /// Grab a card. `None` if the card is not in that column.
    pub fn begin_drag(&self, column_id: &str, card_id: &str) -> Option<DragSession> {
        self.board
            .column(column_id)?
            .card(card_id)
            .map(|_| DragSession::start(column_id, card_id))
    }

    pub fn hover(&self, session: &DragSession, target: &DropTarget) -> HoverFeedback {
        session.hover(&self.board, target)
    }

    /// Finish a drag. A `None` target means the card was released outside
    /// any column and the drag is cancelled.
    #[instrument(level = "debug", skip(self))]
    pub fn finish_drag(&mut self, session: DragSession, target: Option<&DropTarget>) -> bool {
        match target {
            Some(target) => {
                let next = session.drop_on(&self.board, target);
                self.commit(next, "drop")
            }
            None => {
                session.cancel();
                false
            }
        }
    }
}
