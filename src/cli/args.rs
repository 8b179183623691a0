//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Kanban board and lazily-loaded tree, driven from the terminal
#[derive(Parser, Debug)]
#[command(name = "boardtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath, env = "BOARDTREE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print snapshots as JSON instead of rendering them
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the seed board
    Board,

    /// Show the seed tree
    Tree {
        /// Fetch every lazy node before rendering
        #[arg(long)]
        load_all: bool,
    },

    /// Interactive session over a board and a tree
    Shell,

    /// Run a scripted walkthrough
    Demo,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}
