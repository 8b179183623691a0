//! CLI layer: argument parsing, command dispatch, rendering and the shell

pub mod args;
pub mod commands;
pub mod error;
pub mod output;
pub mod render;
pub mod shell;

pub use args::{Cli, Commands};
pub use error::{CliError, CliResult};
