//! Lazy tree service
//!
//! Holds the latest forest and orchestrates child fetches. A fetch runs as a
//! detached future that does not borrow the service; its completion is
//! applied later, by node id, to whatever snapshot is current by then.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{normalize_label, tree, ChildSpec, Forest, ForestIndex, Toggle};
use crate::infrastructure::traits::ChildSource;
use crate::infrastructure::FetchError;

/// What a toggle did.
#[derive(Debug)]
pub enum ToggleOutcome {
    /// Unknown node, or its fetch is already in flight
    Unchanged,
    /// Expanded or collapsed synchronously
    Toggled,
    /// Node is Loading; drive the fetch and hand the completion to `apply`
    Pending(PendingFetch),
}

/// An in-flight child fetch for one node.
pub struct PendingFetch {
    node_id: String,
    ticket: u64,
    fetch: BoxFuture<'static, Result<Vec<ChildSpec>, FetchError>>,
}

impl PendingFetch {
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Wait for the data source.
    pub async fn resolve(self) -> FetchCompletion {
        FetchCompletion {
            node_id: self.node_id,
            ticket: self.ticket,
            result: self.fetch.await,
        }
    }

    pub fn boxed(self) -> BoxFuture<'static, FetchCompletion> {
        self.resolve().boxed()
    }
}

impl fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFetch")
            .field("node_id", &self.node_id)
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Result of a finished fetch, not yet applied.
#[derive(Debug, Clone)]
pub struct FetchCompletion {
    pub node_id: String,
    /// Identifies the fetch among repeated attempts for the same node
    pub ticket: u64,
    pub result: Result<Vec<ChildSpec>, FetchError>,
}

/// Service owning the current forest.
pub struct TreeService {
    forest: Forest,
    source: Arc<dyn ChildSource>,
    timeout: Duration,
    /// Node id to the ticket of its current fetch
    in_flight: HashMap<String, u64>,
    next_ticket: u64,
}

impl TreeService {
    pub fn new(forest: Forest, source: Arc<dyn ChildSource>, timeout: Duration) -> Self {
        Self {
            forest,
            source,
            timeout,
            in_flight: HashMap::new(),
            next_ticket: 0,
        }
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> &Forest {
        &self.forest
    }

    pub fn index(&self) -> ApplicationResult<ForestIndex> {
        ForestIndex::build(&self.forest).map_err(ApplicationError::from)
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.in_flight.contains_key(id)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn commit(&mut self, next: Forest, op: &str) -> bool {
        let same = next.roots.len() == self.forest.roots.len()
            && next
                .roots
                .iter()
                .zip(self.forest.roots.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b));
        if same {
            debug!("{}: no change", op);
            return false;
        }
        self.forest = next;
        true
    }

    /// Add a child under `parent_id`; returns its id, `None` if the parent is gone.
    #[instrument(level = "debug", skip(self))]
    pub fn add_child(&mut self, parent_id: &str, name: &str) -> ApplicationResult<Option<String>> {
        let name = normalize_label("name", name)?;
        let next = tree::add_child(&self.forest, parent_id, &name);
        if !self.commit(next, "add_child") {
            return Ok(None);
        }
        Ok(tree::find_node(&self.forest, parent_id)
            .and_then(|p| p.children.last())
            .map(|c| c.id.clone()))
    }

    /// Add a new root; returns its id.
    #[instrument(level = "debug", skip(self))]
    pub fn add_root(&mut self, name: &str) -> ApplicationResult<String> {
        let name = normalize_label("name", name)?;
        self.forest = tree::add_root(&self.forest, &name);
        Ok(self
            .forest
            .roots
            .last()
            .map(|r| r.id.clone())
            .unwrap_or_default())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn rename(&mut self, id: &str, name: &str) -> ApplicationResult<bool> {
        let name = normalize_label("name", name)?;
        let next = tree::rename_node(&self.forest, id, &name);
        Ok(self.commit(next, "rename"))
    }

    /// Delete a subtree. Fetches in flight inside it are forgotten, so their
    /// late completions are discarded.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, id: &str) -> bool {
        let doomed = tree::subtree_ids(&self.forest, id);
        let next = tree::delete_node(&self.forest, id);
        if !self.commit(next, "delete") {
            return false;
        }
        for gone in &doomed {
            if self.in_flight.remove(gone).is_some() {
                debug!("delete: dropped in-flight fetch for {}", gone);
            }
        }
        true
    }

    /// Expand or collapse a node, starting a fetch on first expansion.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle(&mut self, id: &str) -> ToggleOutcome {
        match tree::toggle_expand(&self.forest, id) {
            Toggle::Unchanged => ToggleOutcome::Unchanged,
            Toggle::Flipped(next) => {
                self.forest = next;
                ToggleOutcome::Toggled
            }
            Toggle::FetchRequired(next) => {
                self.forest = next;
                self.next_ticket += 1;
                self.in_flight.insert(id.to_string(), self.next_ticket);
                ToggleOutcome::Pending(self.start_fetch(id, self.next_ticket))
            }
        }
    }

    fn start_fetch(&self, id: &str, ticket: u64) -> PendingFetch {
        let source = Arc::clone(&self.source);
        let timeout = self.timeout;
        let node_id = id.to_string();
        let fetch = async move {
            match tokio::time::timeout(timeout, source.fetch_children(&node_id)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::TimedOut {
                    node_id,
                    after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            }
        }
        .boxed();
        debug!("start_fetch: {} (ticket {})", id, ticket);
        PendingFetch {
            node_id: id.to_string(),
            ticket,
            fetch,
        }
    }

    /// Apply a finished fetch to the latest snapshot.
    ///
    /// Returns `Ok(false)` when the completion was discarded because the node
    /// was deleted, or its fetch cancelled or superseded by a newer one. A failed fetch reverts
    /// the node to Collapsed-Unloaded and returns the error.
    #[instrument(level = "debug", skip(self, completion), fields(node_id = %completion.node_id))]
    pub fn apply(&mut self, completion: FetchCompletion) -> ApplicationResult<bool> {
        let FetchCompletion {
            node_id,
            ticket,
            result,
        } = completion;
        if self.in_flight.get(&node_id) != Some(&ticket) {
            debug!("apply: discarding stale fetch {} for {}", ticket, node_id);
            return Ok(false);
        }
        self.in_flight.remove(&node_id);
        match result {
            Ok(children) => {
                self.forest = tree::complete_load(&self.forest, &node_id, children);
                Ok(true)
            }
            Err(e) => {
                warn!("apply: fetch for {} failed: {}", node_id, e);
                self.forest = tree::abort_load(&self.forest, &node_id);
                Err(e.into())
            }
        }
    }

    /// Give up on an in-flight fetch; the node can be toggled again.
    #[instrument(level = "debug", skip(self))]
    pub fn cancel(&mut self, id: &str) -> bool {
        if self.in_flight.remove(id).is_none() {
            return false;
        }
        self.forest = tree::abort_load(&self.forest, id);
        true
    }

    /// Toggle and, if a fetch is needed, wait for it and apply it.
    pub async fn toggle_and_wait(&mut self, id: &str) -> ApplicationResult<()> {
        if let ToggleOutcome::Pending(pending) = self.toggle(id) {
            let completion = pending.resolve().await;
            self.apply(completion)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TreeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeService")
            .field("forest", &self.forest)
            .field("timeout", &self.timeout)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use crate::domain::{NodeState, TreeNode};
    use crate::infrastructure::MockChildSource;

    fn service(source: Arc<MockChildSource>) -> TreeService {
        let forest = Forest::new(vec![TreeNode::lazy("1-1", "Frontend")]);
        TreeService::new(forest, source, Duration::from_secs(1))
    }

    fn state(svc: &TreeService, id: &str) -> Option<NodeState> {
        tree::node_state(svc.snapshot(), id)
    }

    #[tokio::test]
    async fn given_unloaded_node_when_toggled_then_loading_until_applied() {
        let source = Arc::new(MockChildSource::seeded());
        let mut svc = service(source.clone());

        let pending = match svc.toggle("1-1") {
            ToggleOutcome::Pending(p) => p,
            other => panic!("expected pending, got {:?}", other),
        };
        assert_eq!(pending.node_id(), "1-1");
        assert_eq!(state(&svc, "1-1"), Some(NodeState::Loading));
        assert!(svc.is_loading("1-1"));

        let applied = svc.apply(pending.resolve().await).unwrap();
        assert!(applied);
        assert_eq!(state(&svc, "1-1"), Some(NodeState::ExpandedLoaded));
        assert_eq!(svc.in_flight(), 0);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn given_loading_node_when_toggled_again_then_unchanged() {
        let mut svc = service(Arc::new(MockChildSource::seeded()));
        let _pending = svc.toggle("1-1");
        assert!(matches!(svc.toggle("1-1"), ToggleOutcome::Unchanged));
    }

    #[tokio::test]
    async fn given_cancelled_fetch_when_completion_arrives_then_discarded() {
        let mut svc = service(Arc::new(MockChildSource::seeded()));
        let ToggleOutcome::Pending(pending) = svc.toggle("1-1") else {
            panic!("expected pending");
        };
        assert!(svc.cancel("1-1"));
        assert_eq!(state(&svc, "1-1"), Some(NodeState::CollapsedUnloaded));

        assert!(!svc.apply(pending.resolve().await).unwrap());
        assert_eq!(state(&svc, "1-1"), Some(NodeState::CollapsedUnloaded));
    }

    #[tokio::test]
    async fn given_failing_source_when_toggled_then_reverts_with_error() {
        let source = Arc::new(MockChildSource::seeded());
        source.fail_next(1);
        let mut svc = service(source);

        let err = svc.toggle_and_wait("1-1").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Fetch(FetchError::Unavailable { .. })));
        assert_eq!(state(&svc, "1-1"), Some(NodeState::CollapsedUnloaded));

        svc.toggle_and_wait("1-1").await.unwrap();
        assert_eq!(state(&svc, "1-1"), Some(NodeState::ExpandedLoaded));
    }

    #[tokio::test]
    async fn given_cancel_then_retoggle_when_old_fetch_lands_then_only_new_applies() {
        let mut svc = service(Arc::new(MockChildSource::seeded()));
        let ToggleOutcome::Pending(first) = svc.toggle("1-1") else {
            panic!("expected pending");
        };
        svc.cancel("1-1");
        let ToggleOutcome::Pending(second) = svc.toggle("1-1") else {
            panic!("expected pending");
        };

        assert!(!svc.apply(first.resolve().await).unwrap());
        assert_eq!(state(&svc, "1-1"), Some(NodeState::Loading));
        assert!(svc.apply(second.resolve().await).unwrap());
        assert_eq!(state(&svc, "1-1"), Some(NodeState::ExpandedLoaded));
    }

    #[tokio::test(start_paused = true)]
    async fn given_slow_source_when_timeout_elapses_then_timed_out() {
        let source = Arc::new(MockChildSource::seeded().with_latency(Duration::from_secs(10)));
        let forest = Forest::new(vec![TreeNode::lazy("1-1", "Frontend")]);
        let mut svc = TreeService::new(forest, source, Duration::from_millis(50));

        let err = svc.toggle_and_wait("1-1").await.unwrap_err();
        assert_eq!(
            err,
            ApplicationError::Fetch(FetchError::TimedOut {
                node_id: "1-1".into(),
                after_ms: 50
            })
        );
    }

    #[tokio::test]
    async fn given_loading_node_when_deleted_then_in_flight_cleared() {
        let mut svc = service(Arc::new(MockChildSource::seeded()));
        let ToggleOutcome::Pending(pending) = svc.toggle("1-1") else {
            panic!("expected pending");
        };
        assert!(svc.delete("1-1"));
        assert_eq!(svc.in_flight(), 0);
        assert!(!svc.apply(pending.resolve().await).unwrap());
        assert!(svc.snapshot().is_empty());
    }

    #[test]
    fn given_blank_name_when_adding_root_then_invalid_input() {
        let mut svc = service(Arc::new(MockChildSource::seeded()));
        assert!(svc.add_root("   ").is_err());
        assert_eq!(svc.snapshot().roots.len(), 1);
    }

    #[test]
    fn given_same_name_when_renaming_then_no_change() {
        let mut svc = service(Arc::new(MockChildSource::seeded()));
        assert!(!svc.rename("1-1", "Frontend").unwrap());
        assert!(svc.rename("1-1", "UI").unwrap());
    }
}
