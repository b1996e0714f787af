use std::cell::Cell;

use tracing::{debug, warn};

use crate::error::Result;
use crate::tasks::{Task, TaskClient};

/// Monotonic revision counter decoupling "a mutation happened" from "the
/// list must be reloaded". Not domain data; purely a synchronization token.
/// Bumped once per successful mutation, never rolled back.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    revision: Cell<u64>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    pub fn bump(&self) {
        let next = self.revision.get() + 1;
        self.revision.set(next);
        debug!(revision = next, "task list invalidated");
    }
}

/// The in-memory task cache and its refresh cycle. The cache is replaced
/// wholesale on each successful fetch; it is never patched incrementally,
/// so the displayed list always matches the last committed server state.
#[derive(Debug, Default)]
pub struct TaskFeed {
    tasks: Vec<Task>,
    last_error: Option<String>,
    synced_revision: Option<u64>,
}

impl TaskFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The error from the most recent failed fetch, cleared by the next
    /// successful one. The stale cache stays visible alongside it.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_stale(&self, coordinator: &RefreshCoordinator) -> bool {
        self.synced_revision != Some(coordinator.revision())
    }

    /// Refetch if the coordinator has moved past what this feed has seen.
    /// Returns whether a fetch was issued. The revision is marked seen even
    /// when the fetch fails; the mutation already committed server-side,
    /// and `retry` re-issues the same list call.
    pub fn sync(&mut self, coordinator: &RefreshCoordinator, client: &TaskClient) -> bool {
        if !self.is_stale(coordinator) {
            return false;
        }
        self.synced_revision = Some(coordinator.revision());
        self.refresh(client);
        true
    }

    /// Re-issue the list call at the current revision, regardless of
    /// staleness. This is the retry affordance after a failed refresh.
    pub fn retry(&mut self, coordinator: &RefreshCoordinator, client: &TaskClient) {
        self.synced_revision = Some(coordinator.revision());
        self.refresh(client);
    }

    fn refresh(&mut self, client: &TaskClient) {
        match client.list() {
            Ok(tasks) => {
                self.tasks = tasks;
                self.last_error = None;
            }
            Err(e) => {
                warn!(error = %e, "task list refresh failed, keeping previous cache");
                self.last_error = Some(e.to_string());
            }
        }
    }
}

/// Run a mutation, bump the coordinator on success, and sync the feed.
/// Failures skip the bump (nothing committed) and propagate to the caller.
pub fn mutate_and_refresh<T>(
    coordinator: &RefreshCoordinator,
    feed: &mut TaskFeed,
    client: &TaskClient,
    mutation: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let result = mutation()?;
    coordinator.bump();
    feed.sync(coordinator, client);
    Ok(result)
}
