//! Catalogue-backed child source with simulated latency and failures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::config::Settings;
use crate::domain::ChildSpec;
use crate::infrastructure::error::FetchError;
use crate::infrastructure::seed;
use crate::infrastructure::traits::ChildSource;

/// Stand-in for a remote tree API.
///
/// Unknown ids have no children. Ids listed as failing always fail;
/// `fail_next` makes the next N calls fail regardless of id.
#[derive(Debug, Default)]
pub struct MockChildSource {
    latency: Duration,
    catalogue: HashMap<String, Vec<ChildSpec>>,
    failing: HashSet<String>,
    fail_next: AtomicUsize,
    calls: AtomicUsize,
}

impl MockChildSource {
    pub fn new(catalogue: HashMap<String, Vec<ChildSpec>>) -> Self {
        Self {
            catalogue,
            ..Self::default()
        }
    }

    /// Source serving the built-in catalogue.
    pub fn seeded() -> Self {
        Self::new(seed::catalogue())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::seeded()
            .with_latency(settings.fetch_latency())
            .with_failing(settings.fetch.fail_ids.iter().cloned())
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failing<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.failing.extend(ids);
        self
    }

    /// Make the next `n` fetches fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Number of fetches started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChildSource for MockChildSource {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_children(&self, node_id: &str) -> Result<Vec<ChildSpec>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected || self.failing.contains(node_id) {
            debug!("fetch_children: failing {}", node_id);
            return Err(FetchError::Unavailable {
                node_id: node_id.to_string(),
                reason: "simulated outage".into(),
            });
        }

        let children = self.catalogue.get(node_id).cloned().unwrap_or_default();
        debug!("fetch_children: {} -> {} children", node_id, children.len());
        Ok(children)
    }
}
