//! Structured task scope with shutdown-on-first-failure semantics.
//!
//! A [`TaskScope`] is opened at the top of a call, tasks are spawned into it,
//! and [`TaskScope::join`] is awaited before the call returns. `join` drains
//! every spawned task, so no child outlives the frame that opened the scope.
//!
//! Cancellation is cooperative. The first failing child cancels the scope's
//! token; children are expected to check [`TaskScope::token`] (or a token
//! derived from it) between suspension points and bail out with the
//! cancellation error. Scopes opened inside a child use the parent scope's
//! token as their parent, so cancelling a scope reaches the whole subtree.
//!
//! ```rust,no_run
//! use fanout_core::{ScanError, TaskScope};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), ScanError> {
//! let root = CancellationToken::new();
//! let mut scope: TaskScope<u64, ScanError> = TaskScope::new(&root);
//! for n in 0..4u64 {
//!     scope.spawn(async move { Ok(n * 10) });
//! }
//! let results = scope.join().await?;
//! assert_eq!(results, vec![0, 10, 20, 30]);
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Errors that can flow through a [`TaskScope`].
pub trait ScopeError: Send + 'static {
    /// The error a task reports when it stopped because its scope was cancelled.
    fn cancelled() -> Self;

    /// The error recorded when a child task panicked.
    fn panicked(message: String) -> Self;

    /// Whether this value is a cancellation rather than a real failure.
    fn is_cancelled(&self) -> bool;
}

/// A group of tasks whose lifetime is bound to one call.
pub struct TaskScope<T, E> {
    tasks: JoinSet<(usize, Result<T, E>)>,
    token: CancellationToken,
    failure: Option<E>,
    spawned: usize,
}

impl<T, E> TaskScope<T, E>
where
    T: Send + 'static,
    E: ScopeError,
{
    /// Open a scope nested under `parent`.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            token: parent.child_token(),
            failure: None,
            spawned: 0,
        }
    }

    /// Token observed by tasks of this scope.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether this scope or one of its ancestors was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Number of tasks spawned so far.
    pub fn len(&self) -> usize {
        self.spawned
    }

    pub fn is_empty(&self) -> bool {
        self.spawned == 0
    }

    /// Spawn a task into the scope.
    ///
    /// Returns `false` without spawning when the scope is already cancelled.
    pub fn spawn<F>(&mut self, task: F) -> bool
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        if self.token.is_cancelled() {
            return false;
        }
        let index = self.spawned;
        self.spawned += 1;
        self.tasks.spawn(async move { (index, task.await) });
        true
    }

    /// Record a failure and cancel the remaining tasks.
    ///
    /// Only the first real failure is kept; cancellations never fill the slot.
    pub fn fail(&mut self, error: E) {
        if error.is_cancelled() {
            return;
        }
        if self.failure.is_none() {
            debug!(pending = self.tasks.len(), "scope failed, cancelling remaining tasks");
            self.failure = Some(error);
        }
        self.token.cancel();
    }

    /// Wait for every spawned task and collect the results in spawn order.
    ///
    /// Returns the first recorded failure, or the cancellation error when the
    /// scope was cancelled from above without a failure of its own.
    pub async fn join(mut self) -> Result<Vec<T>, E> {
        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None)
            .take(self.spawned)
            .collect();

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((index, Ok(value))) => slots[index] = Some(value),
                Ok((_, Err(error))) => self.fail(error),
                Err(join_error) => self.record_join_error(join_error),
            }
        }

        if let Some(error) = self.failure.take() {
            return Err(error);
        }
        if self.token.is_cancelled() {
            return Err(E::cancelled());
        }

        // Every slot is filled: each task either succeeded or set `failure`.
        let results: Vec<T> = slots.into_iter().flatten().collect();
        debug_assert_eq!(results.len(), self.spawned);
        Ok(results)
    }

    fn record_join_error(&mut self, join_error: JoinError) {
        if join_error.is_panic() {
            let payload = join_error.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            self.fail(E::panicked(message));
        }
        // An aborted task is a cancellation: nothing to report.
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::ScanError;

    type Scope<T> = TaskScope<T, ScanError>;

    #[tokio::test]
    async fn test_results_follow_spawn_order() {
        let root = CancellationToken::new();
        let mut scope: Scope<u32> = TaskScope::new(&root);
        for n in 0..5u32 {
            // Later tasks finish first.
            scope.spawn(async move {
                tokio::time::sleep(Duration::from_millis(u64::from(50 - n * 10))).await;
                Ok(n)
            });
        }
        assert_eq!(scope.len(), 5);
        assert_eq!(scope.join().await.unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_empty_scope_joins_immediately() {
        let root = CancellationToken::new();
        let scope: Scope<u32> = TaskScope::new(&root);
        assert!(scope.is_empty());
        assert!(scope.join().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_cancels_siblings() {
        let root = CancellationToken::new();
        let mut scope: Scope<u32> = TaskScope::new(&root);
        let observed = Arc::new(AtomicUsize::new(0));

        scope.spawn(async { Err(ScanError::io("/bad", std::io::Error::other("boom"))) });
        for _ in 0..8 {
            let token = scope.token().clone();
            let observed = Arc::clone(&observed);
            scope.spawn(async move {
                token.cancelled().await;
                observed.fetch_add(1, Ordering::SeqCst);
                Err(ScanError::Cancelled)
            });
        }

        let err = scope.join().await.unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }));
        // join drained every sibling after it saw the cancellation.
        assert_eq!(observed.load(Ordering::SeqCst), 8);
        // The parent token is unaffected.
        assert!(!root.is_cancelled());
    }

    #[tokio::test]
    async fn test_exactly_one_failure_is_reported() {
        let root = CancellationToken::new();
        let mut scope: Scope<u32> = TaskScope::new(&root);
        for n in 0..16 {
            scope.spawn(async move {
                Err(ScanError::NotFound {
                    path: format!("/missing/{n}").into(),
                })
            });
        }
        let err = scope.join().await.unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_no_spawn_after_cancellation() {
        let root = CancellationToken::new();
        let mut scope: Scope<u32> = TaskScope::new(&root);
        scope.fail(ScanError::invalid_argument("stop"));
        assert!(scope.is_cancelled());
        assert!(!scope.spawn(async { Ok(1) }));
        assert!(matches!(
            scope.join().await,
            Err(ScanError::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancellation_from_parent_is_silent() {
        let root = CancellationToken::new();
        let mut scope: Scope<u32> = TaskScope::new(&root);
        let token = scope.token().clone();
        scope.spawn(async move {
            token.cancelled().await;
            Err(ScanError::Cancelled)
        });
        root.cancel();
        assert!(matches!(scope.join().await, Err(ScanError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellation_does_not_fill_failure_slot() {
        let root = CancellationToken::new();
        let mut scope: Scope<u32> = TaskScope::new(&root);
        scope.fail(ScanError::Cancelled);
        assert!(!scope.is_cancelled());
        scope.spawn(async { Ok(7) });
        assert_eq!(scope.join().await.unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let root = CancellationToken::new();
        let mut scope: Scope<u32> = TaskScope::new(&root);
        scope.spawn(async {
            if true {
                panic!("kaboom");
            }
            Ok(0)
        });
        match scope.join().await {
            Err(ScanError::TaskPanicked { message }) => assert!(message.contains("kaboom")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_nested_scopes_cancel_hierarchically() {
        let root = CancellationToken::new();
        let mut outer: Scope<u32> = TaskScope::new(&root);
        let parent = outer.token().clone();

        outer.spawn(async move {
            let mut inner: Scope<u32> = TaskScope::new(&parent);
            let token = inner.token().clone();
            inner.spawn(async move {
                token.cancelled().await;
                Err(ScanError::Cancelled)
            });
            inner.join().await.map(|v| v.into_iter().sum())
        });
        outer.spawn(async { Err(ScanError::invalid_argument("sibling failed")) });

        assert!(matches!(
            outer.join().await,
            Err(ScanError::InvalidArgument { .. })
        ));
    }
}
