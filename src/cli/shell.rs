//! Interactive session
//!
//! Reads commands line by line and applies them to a board and a forest.
//! Child fetches started by `toggle` run concurrently with further input;
//! each completion is applied to whatever forest is current when it lands.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, instrument};

use crate::application::services::{BoardService, FetchCompletion, ToggleOutcome, TreeService};
use crate::cli::error::{CliError, CliResult};
use crate::cli::{output, render};
use crate::config::DefaultsConfig;
use crate::domain::{DragSession, DropTarget, HoverFeedback};
use crate::infrastructure::InfraError;

pub const HELP: &str = "\
board                               show the board
card add <col> [title..]            append a card
card rename <col> <card> <title..>  rename a card
card rm <col> <card>                delete a card
card mv <src> <card> <dst> [before] move a card, before another or to the end
drag <col> <card>                   pick up a card
hover <col> [card]                  preview a drop
drop <col> [card]                   drop the dragged card
cancel                              release the dragged card outside any column
tree                                show the tree
node add <parent> [name..]          add a child node
node root [name..]                  add a root node
node rename <id> <name..>           rename a node
node rm <id>                        delete a node and its subtree
toggle <id>                         expand or collapse, fetching children once
abort <id>                          give up on a pending fetch
path <id>                           ancestors of a node
wait                                wait for all pending fetches
help                                this text
quit                                leave";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Board,
    AddCard { column: String, title: Option<String> },
    RenameCard { column: String, card: String, title: String },
    DeleteCard { column: String, card: String },
    MoveCard { source: String, card: String, target: String, before: Option<String> },
    Drag { column: String, card: String },
    Hover(DropTarget),
    Drop(DropTarget),
    Cancel,
    Tree,
    AddNode { parent: String, name: Option<String> },
    AddRoot { name: Option<String> },
    RenameNode { id: String, name: String },
    DeleteNode { id: String },
    Toggle { id: String },
    Abort { id: String },
    Path { id: String },
    Wait,
    Help,
    Quit,
}

fn usage(msg: &str) -> CliError {
    CliError::Usage(format!("usage: {}", msg))
}

/// Remaining words joined with single spaces, `None` when there are none.
fn rest(words: &[&str]) -> Option<String> {
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn target(words: &[&str]) -> Option<DropTarget> {
    match words {
        [column] => Some(DropTarget::column(*column)),
        [column, card] => Some(DropTarget::card(*column, *card)),
        _ => None,
    }
}

impl ShellCommand {
    /// Parse a line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> CliResult<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let cmd = match words.as_slice() {
            ["board"] => Self::Board,
            ["tree"] => Self::Tree,
            ["cancel"] => Self::Cancel,
            ["wait"] => Self::Wait,
            ["help"] | ["?"] => Self::Help,
            ["quit"] | ["exit"] => Self::Quit,

            ["card", "add", column, title @ ..] => Self::AddCard {
                column: column.to_string(),
                title: rest(title),
            },
            ["card", "add", ..] => return Err(usage("card add <col> [title..]")),
            ["card", "rename", column, card, title @ ..] if !title.is_empty() => Self::RenameCard {
                column: column.to_string(),
                card: card.to_string(),
                title: title.join(" "),
            },
            ["card", "rename", ..] => return Err(usage("card rename <col> <card> <title..>")),
            ["card", "rm", column, card] => Self::DeleteCard {
                column: column.to_string(),
                card: card.to_string(),
            },
            ["card", "rm", ..] => return Err(usage("card rm <col> <card>")),
            ["card", "mv", source, card, target, before @ ..] if before.len() <= 1 => {
                Self::MoveCard {
                    source: source.to_string(),
                    card: card.to_string(),
                    target: target.to_string(),
                    before: before.first().map(|s| s.to_string()),
                }
            }
            ["card", "mv", ..] => return Err(usage("card mv <src> <card> <dst> [before]")),

            ["drag", column, card] => Self::Drag {
                column: column.to_string(),
                card: card.to_string(),
            },
            ["drag", ..] => return Err(usage("drag <col> <card>")),
            ["hover", args @ ..] => {
                Self::Hover(target(args).ok_or_else(|| usage("hover <col> [card]"))?)
            }
            ["drop", args @ ..] => Self::Drop(target(args).ok_or_else(|| usage("drop <col> [card]"))?),

            ["node", "add", parent, name @ ..] => Self::AddNode {
                parent: parent.to_string(),
                name: rest(name),
            },
            ["node", "add", ..] => return Err(usage("node add <parent> [name..]")),
            ["node", "root", name @ ..] => Self::AddRoot { name: rest(name) },
            ["node", "rename", id, name @ ..] if !name.is_empty() => Self::RenameNode {
                id: id.to_string(),
                name: name.join(" "),
            },
            ["node", "rename", ..] => return Err(usage("node rename <id> <name..>")),
            ["node", "rm", id] => Self::DeleteNode { id: id.to_string() },
            ["node", "rm", ..] => return Err(usage("node rm <id>")),

            ["toggle", id] => Self::Toggle { id: id.to_string() },
            ["toggle", ..] => return Err(usage("toggle <id>")),
            ["abort", id] => Self::Abort { id: id.to_string() },
            ["abort", ..] => return Err(usage("abort <id>")),
            ["path", id] => Self::Path { id: id.to_string() },
            ["path", ..] => return Err(usage("path <id>")),

            [other, ..] => {
                return Err(CliError::InvalidArgs(format!(
                    "unknown command '{}', try 'help'",
                    other
                )))
            }
            [] => return Ok(None),
        };
        Ok(Some(cmd))
    }
}

/// Whether the session should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Board, forest and the fetches still in flight.
pub struct Session {
    pub board: BoardService,
    pub tree: TreeService,
    defaults: DefaultsConfig,
    json: bool,
    drag: Option<DragSession>,
    pending: FuturesUnordered<BoxFuture<'static, FetchCompletion>>,
}

impl Session {
    pub fn new(board: BoardService, tree: TreeService, defaults: DefaultsConfig, json: bool) -> Self {
        Self {
            board,
            tree,
            defaults,
            json,
            drag: None,
            pending: FuturesUnordered::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn dragging(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    fn show_board(&self) -> CliResult<()> {
        if self.json {
            output::info(&render::json(self.board.snapshot())?);
        } else {
            print!("{}", render::board(self.board.snapshot()));
        }
        Ok(())
    }

    fn show_tree(&self) -> CliResult<()> {
        if self.json {
            output::info(&render::json(self.tree.snapshot())?);
        } else {
            print!("{}", render::forest(self.tree.snapshot()));
        }
        Ok(())
    }

    fn report(changed: bool, what: &str) {
        if changed {
            output::success(what);
        } else {
            output::warning(&format!("{}: nothing to change", what));
        }
    }

    /// Apply a finished fetch; failures are reported, never fatal.
    pub fn complete(&mut self, completion: FetchCompletion) {
        let id = completion.node_id.clone();
        match self.tree.apply(completion) {
            Ok(true) => output::action("loaded", &id),
            Ok(false) => debug!("complete: ignored stale fetch for {}", id),
            Err(e) => output::error(&e),
        }
    }

    /// Drive every pending fetch to completion.
    pub async fn wait_all(&mut self) {
        while let Some(completion) = self.pending.next().await {
            self.complete(completion);
        }
    }

    /// Next finished fetch, or `None` when nothing is pending.
    pub async fn next_completion(&mut self) -> Option<FetchCompletion> {
        self.pending.next().await
    }

    /// Ids from the root down to `id`, `None` if the node is unknown.
    pub fn ancestors(&self, id: &str) -> CliResult<Option<Vec<String>>> {
        let index = self.tree.index()?;
        if !index.contains(id) {
            return Ok(None);
        }
        Ok(Some(index.path_to(id).into_iter().map(String::from).collect()))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn execute(&mut self, cmd: ShellCommand) -> CliResult<Flow> {
        match cmd {
            ShellCommand::Board => self.show_board()?,
            ShellCommand::Tree => self.show_tree()?,
            ShellCommand::Help => output::info(HELP),
            ShellCommand::Quit => return Ok(Flow::Quit),
            ShellCommand::Wait => {
                self.wait_all().await;
                self.show_tree()?;
            }

            ShellCommand::AddCard { column, title } => {
                let title = title.unwrap_or_else(|| self.defaults.card_title.clone());
                match self.board.add_card(&column, &title)? {
                    Some(id) => output::action("added", &id),
                    None => output::warning(&format!("no column '{}'", column)),
                }
            }
            ShellCommand::RenameCard { column, card, title } => {
                Self::report(self.board.rename_card(&column, &card, &title)?, "renamed");
            }
            ShellCommand::DeleteCard { column, card } => {
                Self::report(self.board.delete_card(&column, &card), "deleted");
            }
            ShellCommand::MoveCard { source, card, target, before } => {
                Self::report(
                    self.board.move_card(&source, &card, &target, before.as_deref()),
                    "moved",
                );
            }

            ShellCommand::Drag { column, card } => match self.board.begin_drag(&column, &card) {
                Some(session) => {
                    self.drag = Some(session);
                    output::action("dragging", &card);
                }
                None => output::warning(&format!("no card '{}' in '{}'", card, column)),
            },
            ShellCommand::Hover(target) => match &self.drag {
                Some(session) => {
                    let feedback = match self.board.hover(session, &target) {
                        HoverFeedback::Accepts => "would move here",
                        HoverFeedback::SelfTarget => "dropping here changes nothing",
                        HoverFeedback::Invalid => "not a drop target",
                    };
                    output::detail(feedback);
                }
                None => output::warning("not dragging"),
            },
            ShellCommand::Drop(target) => match self.drag.take() {
                Some(session) => Self::report(self.board.finish_drag(session, Some(&target)), "dropped"),
                None => output::warning("not dragging"),
            },
            ShellCommand::Cancel => match self.drag.take() {
                Some(session) => {
                    self.board.finish_drag(session, None);
                    output::detail("drag cancelled");
                }
                None => output::warning("not dragging"),
            },

            ShellCommand::AddNode { parent, name } => {
                let name = name.unwrap_or_else(|| self.defaults.node_name.clone());
                match self.tree.add_child(&parent, &name)? {
                    Some(id) => output::action("added", &id),
                    None => output::warning(&format!("no node '{}'", parent)),
                }
            }
            ShellCommand::AddRoot { name } => {
                let name = name.unwrap_or_else(|| self.defaults.node_name.clone());
                let id = self.tree.add_root(&name)?;
                output::action("added", &id);
            }
            ShellCommand::RenameNode { id, name } => {
                Self::report(self.tree.rename(&id, &name)?, "renamed");
            }
            ShellCommand::DeleteNode { id } => Self::report(self.tree.delete(&id), "deleted"),
            ShellCommand::Toggle { id } => match self.tree.toggle(&id) {
                ToggleOutcome::Unchanged => output::warning(&format!("'{}' unchanged", id)),
                ToggleOutcome::Toggled => self.show_tree()?,
                ToggleOutcome::Pending(fetch) => {
                    output::detail(&format!("loading children of {}", fetch.node_id()));
                    self.pending.push(fetch.boxed());
                }
            },
            ShellCommand::Abort { id } => Self::report(self.tree.cancel(&id), "aborted"),
            ShellCommand::Path { id } => match self.ancestors(&id)? {
                Some(path) => output::info(&path.join(" / ")),
                None => output::warning(&format!("no node '{}'", id)),
            },
        }
        Ok(Flow::Continue)
    }

    /// Parse and execute one line. Errors are reported and the session goes on.
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        let result = match ShellCommand::parse(line) {
            Ok(Some(cmd)) => self.execute(cmd).await,
            Ok(None) => Ok(Flow::Continue),
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            output::error(&e);
            Flow::Continue
        })
    }
}

enum Event {
    Line(std::io::Result<Option<String>>),
    Fetched(FetchCompletion),
}

/// Read stdin until `quit` or EOF, applying fetch completions as they land.
///
/// On EOF the remaining fetches are awaited so piped scripts see their
/// results.
pub async fn run(session: &mut Session) -> CliResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    output::prompt("boardtree>");
    loop {
        let has_pending = session.pending() > 0;
        let event = tokio::select! {
            line = lines.next_line() => Event::Line(line),
            Some(done) = session.next_completion(), if has_pending => Event::Fetched(done),
        };
        match event {
            Event::Fetched(done) => session.complete(done),
            Event::Line(line) => {
                let line = line.map_err(|e| InfraError::io("read stdin", e))?;
                let Some(line) = line else {
                    session.wait_all().await;
                    break;
                };
                if session.handle_line(&line).await == Flow::Quit {
                    break;
                }
                output::prompt("boardtree>");
            }
        }
    }
    Ok(())
}
