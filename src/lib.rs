//! Snapshot engines for a drag-and-drop kanban board and a lazily-loaded tree.
//!
//! Every operation takes the current snapshot and returns the next one;
//! services in [`application`] hold the latest snapshot and apply intents in
//! order, while [`infrastructure`] supplies the asynchronous child source.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
