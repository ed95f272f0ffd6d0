use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::{AbortHandle, JoinHandle};

use mixgate_core::Status;

/// Completion callback. Invoked at most once per call.
pub type DoneFunc = Box<dyn FnOnce(Status) + Send + 'static>;

/// Aborts an in-flight call. A no-op once the call has completed.
#[derive(Debug, Default)]
pub struct CancelHandle {
    abort: Option<AbortHandle>,
}

impl CancelHandle {
    /// Handle for calls that finished synchronously.
    pub fn noop() -> Self {
        Self { abort: None }
    }

    pub(crate) fn for_task<T>(task: &JoinHandle<T>) -> Self {
        Self {
            abort: Some(task.abort_handle()),
        }
    }

    pub fn cancel(&self) {
        if let Some(a) = &self.abort {
            a.abort();
        }
    }

    /// True when no remote call was started.
    pub fn is_noop(&self) -> bool {
        self.abort.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.abort.as_ref().map_or(true, |a| a.is_finished())
    }
}

/// Process-wide quota deduplication counter. Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct DedupCounter(Arc<AtomicU64>);

impl DedupCounter {
    pub fn starting_at(start: u64) -> Self {
        Self(Arc::new(AtomicU64::new(start)))
    }

    /// Returns the current value and advances by one.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    pub fn peek(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
