//! Integration tests for the kanban engine and the drag session.
//!
//! Every operation takes a board and returns a new one; the input board is
//! never changed, and a card lives in exactly one column at all times.

use std::collections::HashSet;
use std::sync::Arc;

use rstest::{fixture, rstest};

use boardtree::application::services::BoardService;
use boardtree::domain::{kanban, Board, Card, Column, DragSession, DropTarget, HoverFeedback};
use boardtree::infrastructure::seed;

fn titles(board: &Board, column_id: &str) -> Vec<String> {
    board
        .column(column_id)
        .map(|c| c.cards.iter().map(|card| card.title.clone()).collect())
        .unwrap_or_default()
}

fn ids(board: &Board, column_id: &str) -> Vec<String> {
    board
        .column(column_id)
        .map(|c| c.cards.iter().map(|card| card.id.clone()).collect())
        .unwrap_or_default()
}

fn assert_unique_cards(board: &Board) {
    let mut seen = HashSet::new();
    for column in &board.columns {
        for card in &column.cards {
            assert!(seen.insert(card.id.clone()), "card {} appears twice", card.id);
        }
    }
}

#[fixture]
fn ab_board() -> Board {
    Board::new(vec![
        Column::new("A", "A", "#000000").with_cards(vec![
            Card::with_id("x", "X"),
            Card::with_id("y", "Y"),
        ]),
        Column::new("B", "B", "#FFFFFF").with_cards(vec![Card::with_id("z", "Z")]),
    ])
}

// ============================================================
// Card operations
// ============================================================

#[test]
fn given_empty_todo_when_adding_card_then_single_card_with_title() {
    let board = Board::new(vec![Column::new("todo", "Todo", "#2196F3")]);

    let next = kanban::add_card(&board, "todo", "Write spec");

    assert_eq!(titles(&next, "todo"), vec!["Write spec"]);
    assert!(titles(&board, "todo").is_empty(), "input board must not change");
}

#[test]
fn given_missing_card_when_deleting_then_board_unchanged() {
    let board = seed::board();

    let next = kanban::delete_card(&board, "todo", "missing-id");

    assert_eq!(next, board);
}

#[rstest]
fn given_card_when_renamed_then_only_title_changes(ab_board: Board) {
    let next = kanban::rename_card(&ab_board, "A", "y", "Why");

    assert_eq!(titles(&next, "A"), vec!["X", "Why"]);
    assert_eq!(ids(&next, "A"), vec!["x", "y"]);
    assert!(Arc::ptr_eq(&ab_board.columns[1], &next.columns[1]));
}

// ============================================================
// Moves
// ============================================================

#[rstest]
fn given_two_columns_when_moving_before_card_then_inserted_before(ab_board: Board) {
    let next = kanban::move_card(&ab_board, "A", "x", "B", Some("z"));

    assert_eq!(ids(&next, "A"), vec!["y"]);
    assert_eq!(ids(&next, "B"), vec!["x", "z"]);
    assert_unique_cards(&next);
}

#[rstest]
fn given_column_target_when_moving_then_appended(ab_board: Board) {
    let next = kanban::move_card(&ab_board, "A", "x", "B", None);

    assert_eq!(ids(&next, "B"), vec!["z", "x"]);
}

#[rstest]
fn given_card_dropped_on_itself_when_moving_then_identity(ab_board: Board) {
    let next = kanban::move_card(&ab_board, "A", "x", "A", Some("x"));

    assert_eq!(next, ab_board);
}

#[rstest]
fn given_own_id_as_target_card_in_other_column_when_moving_then_appended(ab_board: Board) {
    let next = kanban::move_card(&ab_board, "A", "x", "B", Some("x"));

    assert_eq!(ids(&next, "A"), vec!["y"]);
    assert_eq!(ids(&next, "B"), vec!["z", "x"]);
    assert_unique_cards(&next);
}

#[rstest]
#[case("A", "nope", "B", None)]
#[case("A", "x", "nowhere", None)]
#[case("B", "x", "A", None)]
fn given_unknown_source_or_target_when_moving_then_unchanged(
    ab_board: Board,
    #[case] src: &str,
    #[case] card: &str,
    #[case] dst: &str,
    #[case] before: Option<&str>,
) {
    let next = kanban::move_card(&ab_board, src, card, dst, before);

    assert_eq!(next, ab_board);
    assert_eq!(next.card_count(), 3);
}

#[rstest]
fn given_sequence_of_edits_when_applied_then_cards_stay_unique(ab_board: Board) {
    let mut svc = BoardService::new(ab_board);
    svc.add_card("A", "New").unwrap();
    svc.move_card("A", "x", "B", Some("z"));
    svc.move_card("B", "z", "A", None);
    svc.move_card("B", "x", "B", None);
    svc.delete_card("A", "y");

    let board = svc.snapshot();
    assert_unique_cards(board);
    assert!(board.validate().is_ok());
    assert_eq!(board.card_count(), 3);
}

// ============================================================
// Drag and drop
// ============================================================

#[rstest]
fn given_drag_when_hovering_then_board_untouched(ab_board: Board) {
    let session = DragSession::start("A", "x");

    assert_eq!(session.hover(&ab_board, &DropTarget::column("B")), HoverFeedback::Accepts);
    assert_eq!(
        session.hover(&ab_board, &DropTarget::card("A", "x")),
        HoverFeedback::SelfTarget
    );
    assert_eq!(
        session.hover(&ab_board, &DropTarget::card("B", "x")),
        HoverFeedback::Accepts
    );
    assert_eq!(
        session.hover(&ab_board, &DropTarget::column("C")),
        HoverFeedback::Invalid
    );
}

#[rstest]
fn given_drag_when_released_outside_then_cancelled(ab_board: Board) {
    let mut svc = BoardService::new(ab_board.clone());
    let session = svc.begin_drag("A", "x").unwrap();

    assert!(!svc.finish_drag(session, None));
    assert_eq!(svc.snapshot(), &ab_board);
}

#[rstest]
fn given_drag_when_dropped_on_card_then_moved_before_it(ab_board: Board) {
    let mut svc = BoardService::new(ab_board);
    let session = svc.begin_drag("A", "y").unwrap();

    assert!(svc.finish_drag(session, Some(&DropTarget::card("B", "z"))));
    assert_eq!(ids(svc.snapshot(), "B"), vec!["y", "z"]);
    assert_eq!(ids(svc.snapshot(), "A"), vec!["x"]);
}
