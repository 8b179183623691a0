//! Terminal rendering of board and forest snapshots

use std::sync::Arc;

use colored::{ColoredString, Colorize};
use serde::Serialize;
use termtree::Tree;

use crate::cli::error::{CliError, CliResult};
use crate::domain::{Board, Column, Forest, NodeState, TreeNode};
use crate::infrastructure::InfraError;

/// Parse `#RRGGBB` into an RGB triple.
fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn column_header(column: &Column) -> ColoredString {
    let label = format!("{} ({})", column.title, column.cards.len());
    match parse_hex(&column.color) {
        Some((r, g, b)) => label.truecolor(r, g, b).bold(),
        None => label.bold(),
    }
}

/// Columns one below the other, cards indented with their ids.
pub fn board(board: &Board) -> String {
    let mut out = String::new();
    for column in &board.columns {
        out.push_str(&format!("{} {}\n", column_header(column), column.id.dimmed()));
        if column.cards.is_empty() {
            out.push_str(&format!("  {}\n", "(empty)".dimmed()));
        }
        for card in &column.cards {
            out.push_str(&format!("  - {} {}\n", card.title, card.id.dimmed()));
        }
    }
    out
}

fn marker(node: &TreeNode) -> &'static str {
    match node.state() {
        NodeState::Loading => "…",
        NodeState::CollapsedUnloaded => "▸",
        NodeState::CollapsedLoaded if node.children.is_empty() => "•",
        NodeState::CollapsedLoaded => "▸",
        NodeState::ExpandedLoaded if node.children.is_empty() => "•",
        NodeState::ExpandedLoaded => "▾",
    }
}

fn node_label(node: &TreeNode) -> String {
    let mut label = format!("{} {} [{}]", marker(node), node.name, node.id);
    if node.loading {
        label.push_str(" loading");
    }
    label
}

fn to_termtree(node: &Arc<TreeNode>) -> Tree<String> {
    let tree = Tree::new(node_label(node));
    if node.shows_children() {
        tree.with_leaves(node.children.iter().map(to_termtree))
    } else {
        tree
    }
}

/// Visible part of the forest: children of collapsed nodes are hidden.
pub fn forest(forest: &Forest) -> String {
    if forest.is_empty() {
        return "(empty forest)\n".into();
    }
    forest
        .roots
        .iter()
        .map(|root| to_termtree(root).to_string())
        .collect()
}

/// Pretty JSON for `--json` output.
pub fn json<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        CliError::Infra(InfraError::io(
            "serialize snapshot",
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        ))
    })
}
