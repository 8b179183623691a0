//! Initial snapshots and the mock child catalogue.

use std::collections::HashMap;

use crate::domain::{Board, Card, ChildSpec, Column, Forest, TreeNode};

/// Three fixed columns with two cards each.
pub fn board() -> Board {
    Board::new(vec![
        Column::new("todo", "Todo", "#2196F3").with_cards(vec![
            Card::new("Create project plan"),
            Card::new("Design landing page"),
        ]),
        Column::new("inprogress", "In Progress", "#FF9800").with_cards(vec![
            Card::new("Implement authentication"),
            Card::new("Fix navbar bugs"),
        ]),
        Column::new("done", "Done", "#4CAF50").with_cards(vec![
            Card::new("Setup repo"),
            Card::new("Write API documentation"),
        ]),
    ])
}

/// One expanded root with two children whose subtrees are fetched lazily.
pub fn forest() -> Forest {
    Forest::new(vec![TreeNode::leaf("1", "Full Stack Development")
        .with_expanded(true)
        .with_children(vec![
            TreeNode::lazy("1-1", "Frontend"),
            TreeNode::lazy("1-2", "Backend"),
        ])])
}

/// Children served by the mock source, keyed by parent id.
pub fn catalogue() -> HashMap<String, Vec<ChildSpec>> {
    HashMap::from([
        (
            "1-1".to_string(),
            vec![
                ChildSpec::leaf("1-1-1", "React"),
                ChildSpec::leaf("1-1-2", "TypeScript"),
            ],
        ),
        (
            "1-2".to_string(),
            vec![
                ChildSpec::leaf("1-2-1", "Node.js"),
                ChildSpec::expandable("1-2-2", "Database"),
            ],
        ),
        (
            "1-2-2".to_string(),
            vec![
                ChildSpec::leaf("1-2-2-1", "PostgreSQL"),
                ChildSpec::leaf("1-2-2-2", "Redis"),
            ],
        ),
    ])
}
