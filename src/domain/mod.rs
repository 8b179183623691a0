//! Domain layer: entities and pure snapshot transitions
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod drag;
pub mod entities;
pub mod error;
pub mod id;
pub mod kanban;
pub mod tree;

pub use arena::{ForestIndex, IndexedNode, VisibleRow};
pub use drag::{DragSession, DropTarget, HoverFeedback};
pub use entities::*;
pub use error::{normalize_label, DomainError, DomainResult};
pub use id::uid;
pub use tree::Toggle;
