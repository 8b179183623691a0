//! Service container for dependency injection
//!
//! Wires up services with their dependencies.

use std::sync::Arc;

use crate::application::services::{BoardService, TreeService};
use crate::config::Settings;
use crate::infrastructure::mock_source::MockChildSource;
use crate::infrastructure::seed;
use crate::infrastructure::traits::ChildSource;

/// Container holding settings and the shared child source.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Where lazily loaded children come from
    pub source: Arc<dyn ChildSource>,
}

impl ServiceContainer {
    /// Create a container serving the built-in catalogue.
    pub fn new(settings: Settings) -> Self {
        let source = Arc::new(MockChildSource::from_settings(&settings));
        Self::with_deps(settings, source)
    }

    /// Create a container with a custom child source (for testing).
    pub fn with_deps(settings: Settings, source: Arc<dyn ChildSource>) -> Self {
        Self {
            settings: Arc::new(settings),
            source,
        }
    }

    /// Board service over the seed board.
    pub fn board_service(&self) -> BoardService {
        BoardService::new(seed::board())
    }

    /// Tree service over the seed forest.
    pub fn tree_service(&self) -> TreeService {
        TreeService::new(
            seed::forest(),
            Arc::clone(&self.source),
            self.settings.fetch_timeout(),
        )
    }
}
