//! I/O boundary traits for testability
//!
//! The tree service only ever talks to its data source through
//! [`ChildSource`], so tests and the demo can swap in scripted sources.

use async_trait::async_trait;

use crate::domain::ChildSpec;
use crate::infrastructure::error::FetchError;

/// Asynchronous, fallible provider of a node's children.
#[async_trait]
pub trait ChildSource: Send + Sync {
    /// Fetch the ordered children of `node_id`. May be slow; may fail.
    async fn fetch_children(&self, node_id: &str) -> Result<Vec<ChildSpec>, FetchError>;
}
