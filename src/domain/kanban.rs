//! Kanban board transitions.
//!
//! Every function takes a board snapshot and returns a new one. Input is
//! never mutated; columns that a transition does not touch stay shared with
//! the previous snapshot. Unknown column or card ids leave the board as is.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::entities::{Board, Card};

/// Append a new card with a fresh id to the end of a column.
///
/// No-op if the column does not exist or the trimmed title is empty.
#[instrument(level = "debug", skip(board))]
pub fn add_card(board: &Board, column_id: &str, title: &str) -> Board {
    let title = title.trim();
    if title.is_empty() {
        debug!("add_card: empty title rejected");
        return board.clone();
    }
    insert_card(board, column_id, Card::new(title))
}

/// Append an existing card value to a column. Ids are the caller's concern.
pub(crate) fn insert_card(board: &Board, column_id: &str, card: Card) -> Board {
    let Some(col_idx) = board.column_index(column_id) else {
        debug!("insert_card: column {} not found", column_id);
        return board.clone();
    };
    let mut next = board.clone();
    Arc::make_mut(&mut next.columns[col_idx]).cards.push(card);
    next
}

/// Replace a card's title, keeping its position.
#[instrument(level = "debug", skip(board))]
pub fn rename_card(board: &Board, column_id: &str, card_id: &str, new_title: &str) -> Board {
    let new_title = new_title.trim();
    if new_title.is_empty() {
        debug!("rename_card: empty title rejected");
        return board.clone();
    }
    let Some((col_idx, card_idx)) = find(board, column_id, card_id) else {
        return board.clone();
    };
    let mut next = board.clone();
    Arc::make_mut(&mut next.columns[col_idx]).cards[card_idx].title = new_title.to_string();
    next
}

/// Remove a card from its column.
#[instrument(level = "debug", skip(board))]
pub fn delete_card(board: &Board, column_id: &str, card_id: &str) -> Board {
    let Some((col_idx, card_idx)) = find(board, column_id, card_id) else {
        return board.clone();
    };
    let mut next = board.clone();
    Arc::make_mut(&mut next.columns[col_idx]).cards.remove(card_idx);
    next
}

/// Move a card between (or within) columns.
///
/// The card is removed from the source column first, then inserted right
/// before `target_card_id` in the target column, or appended when the target
/// card is absent or not given. Dropping a card on itself in its own column
/// changes nothing.
/// A missing source card or target column leaves the board untouched, so a
/// card is never orphaned.
#[instrument(level = "debug", skip(board))]
pub fn move_card(
    board: &Board,
    source_column_id: &str,
    card_id: &str,
    target_column_id: &str,
    target_card_id: Option<&str>,
) -> Board {
    if source_column_id == target_column_id && target_card_id == Some(card_id) {
        debug!("move_card: dropped onto itself");
        return board.clone();
    }
    let Some((src_idx, card_idx)) = find(board, source_column_id, card_id) else {
        debug!("move_card: source card not found, drag dropped");
        return board.clone();
    };
    let Some(dst_idx) = board.column_index(target_column_id) else {
        debug!("move_card: target column {} not found", target_column_id);
        return board.clone();
    };

    let mut next = board.clone();
    let card = Arc::make_mut(&mut next.columns[src_idx])
        .cards
        .remove(card_idx);

    // Index lookup happens after removal so same-column moves land correctly.
    let target = Arc::make_mut(&mut next.columns[dst_idx]);
    let insert_at = target_card_id
        .and_then(|id| target.position_of(id))
        .unwrap_or(target.cards.len());
    target.cards.insert(insert_at, card);

    debug!(
        "move_card: {} -> {}[{}]",
        source_column_id, target_column_id, insert_at
    );
    next
}

fn find(board: &Board, column_id: &str, card_id: &str) -> Option<(usize, usize)> {
    let col_idx = board.column_index(column_id)?;
    let card_idx = board.columns[col_idx].position_of(card_id)?;
    Some((col_idx, card_idx))
}
