//! Per-document debounce scheduling.
//!
//! Each document has at most one pending timer. Scheduling again replaces
//! the pending timer, so a burst of edits results in a single run once the
//! document has been quiet for the configured window.

use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

struct Pending {
    generation: u64,
    /// `None` only between registering the timer and spawning its task.
    handle: Option<JoinHandle<()>>,
}

/// Coalesces bursts of work per document.
pub struct Debouncer {
    delay_ms: AtomicU64,
    next_generation: AtomicU64,
    pending: Arc<DashMap<String, Pending>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay_ms: AtomicU64::new(delay.as_millis() as u64),
            next_generation: AtomicU64::new(0),
            pending: Arc::new(DashMap::new()),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.load(Ordering::Relaxed))
    }

    /// Change the quiescence window for timers scheduled from now on.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    /// Run `run` once `document_id` has seen no further `schedule` call for
    /// the debounce window. A pending timer for the same document is
    /// cancelled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, document_id: &str, run: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let id = document_id.to_string();

        let previous = self.pending.insert(
            id.clone(),
            Pending {
                generation,
                handle: None,
            },
        );
        if let Some(handle) = previous.and_then(|p| p.handle) {
            handle.abort();
        }

        let delay = self.delay();
        let pending = Arc::clone(&self.pending);
        let timer_id = id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Clear our entry before running so `run` may schedule again.
            let current = pending.remove_if(&timer_id, |_, p| p.generation == generation);
            if current.is_some() {
                log::debug!("Debounce window elapsed for {}", timer_id);
                run.await;
            }
        });

        if let Some(mut entry) = self.pending.get_mut(&id) {
            if entry.generation == generation {
                entry.handle = Some(handle);
            }
        }
        log::trace!("Scheduled run #{} for {}", generation, id);
    }

    /// Drop the pending timer for `document_id` without running it.
    pub fn cancel(&self, document_id: &str) {
        if let Some((_, pending)) = self.pending.remove(document_id) {
            if let Some(handle) = pending.handle {
                handle.abort();
            }
            log::debug!("Cancelled pending run for {}", document_id);
        }
    }

    pub fn is_pending(&self, document_id: &str) -> bool {
        self.pending.contains_key(document_id)
    }

    /// Number of documents with a pending timer.
    #[cfg(test)]
    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        for entry in self.pending.iter() {
            if let Some(handle) = &entry.handle {
                handle.abort();
            }
        }
    }
}
