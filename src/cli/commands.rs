//! Command dispatch

use std::collections::HashSet;
use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::TreeService;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::CliResult;
use crate::cli::shell::{self, Session};
use crate::cli::{output, render};
use crate::config::{global_config_path, Settings};
use crate::domain::{ForestIndex, NodeState};
use crate::infrastructure::ServiceContainer;

/// Lines replayed by `demo`, one per step.
pub const DEMO_SCRIPT: &[&str] = &[
    "board",
    "card add todo Review pull request",
    "drag todo {card}",
    "hover todo {card}",
    "hover inprogress",
    "drop inprogress",
    "card rename inprogress {card} Review and merge pull request",
    "tree",
    "toggle 1-1",
    "toggle 1-2",
    "node add 1-2 Message queue",
    "wait",
    "toggle 1-2-2",
    "wait",
    "toggle 1-1",
    "toggle 1-1",
    "node rm 1-2-2",
    "tree",
];

pub async fn execute_command(cli: &Cli, settings: Settings) -> CliResult<()> {
    let container = ServiceContainer::new(settings);
    match &cli.command {
        None | Some(Commands::Board) => _board(&container, cli.json),
        Some(Commands::Tree { load_all }) => _tree(&container, *load_all, cli.json).await,
        Some(Commands::Shell) => _shell(&container, cli.json).await,
        Some(Commands::Demo) => _demo(&container, cli.json).await,
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => _config_show(&container),
            ConfigCommands::Path => _config_path(cli),
        },
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "boardtree", &mut io::stdout());
            Ok(())
        }
    }
}

fn session(container: &ServiceContainer, json: bool) -> Session {
    Session::new(
        container.board_service(),
        container.tree_service(),
        container.settings.defaults.clone(),
        json,
    )
}

#[instrument(skip(container))]
fn _board(container: &ServiceContainer, json: bool) -> CliResult<()> {
    let service = container.board_service();
    if json {
        output::info(&render::json(service.snapshot())?);
    } else {
        print!("{}", render::board(service.snapshot()));
    }
    Ok(())
}

/// Fetch every node that is still unloaded, each at most once.
pub async fn load_all(tree: &mut TreeService) {
    let mut attempted = HashSet::new();
    loop {
        let next = match ForestIndex::build(tree.snapshot()) {
            Ok(index) => index
                .iter()
                .find(|n| n.state == NodeState::CollapsedUnloaded && !attempted.contains(&n.id))
                .map(|n| n.id.clone()),
            Err(e) => {
                output::error(&e);
                None
            }
        };
        let Some(id) = next else { break };
        debug!("load_all: {}", id);
        if let Err(e) = tree.toggle_and_wait(&id).await {
            output::warning(&e);
        }
        attempted.insert(id);
    }
}

#[instrument(skip(container))]
async fn _tree(container: &ServiceContainer, load: bool, json: bool) -> CliResult<()> {
    let mut service = container.tree_service();
    if load {
        load_all(&mut service).await;
    }
    if json {
        output::info(&render::json(service.snapshot())?);
    } else {
        print!("{}", render::forest(service.snapshot()));
    }
    Ok(())
}

async fn _shell(container: &ServiceContainer, json: bool) -> CliResult<()> {
    let mut session = session(container, json);
    output::header("boardtree shell, 'help' lists commands");
    shell::run(&mut session).await
}

/// Replay [`DEMO_SCRIPT`]. `{card}` stands for the card picked up by the
/// drag step: the first card of `todo`, whose id is only known at runtime.
async fn _demo(container: &ServiceContainer, json: bool) -> CliResult<()> {
    let mut session = session(container, json);
    let card = session
        .board
        .snapshot()
        .column("todo")
        .and_then(|c| c.cards.first())
        .map(|c| c.id.clone())
        .unwrap_or_default();
    for step in DEMO_SCRIPT {
        let line = step.replace("{card}", &card);
        output::header(&format!("> {}", line));
        session.handle_line(&line).await;
    }
    session.wait_all().await;
    Ok(())
}

fn _config_show(container: &ServiceContainer) -> CliResult<()> {
    output::info(&container.settings.to_toml()?);
    Ok(())
}

fn _config_path(cli: &Cli) -> CliResult<()> {
    match global_config_path() {
        Some(path) => {
            let marker = if path.exists() { "" } else { " (missing)" };
            output::action("global", &format!("{}{}", path.display(), marker));
        }
        None => output::warning("no config directory on this platform"),
    }
    if let Some(path) = &cli.config {
        output::action("explicit", &path.display());
    }
    Ok(())
}
