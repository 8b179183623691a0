//! Application services
//!
//! Concrete services that own the latest snapshot of each engine.
//! The tree service depends on the `ChildSource` boundary trait but is
//! itself a concrete struct, not a trait.

mod board;
mod tree;

pub use board::BoardService;
pub use tree::{FetchCompletion, PendingFetch, ToggleOutcome, TreeService};
