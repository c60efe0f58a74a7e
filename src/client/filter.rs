use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::models::ProductFilter;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Coalesces rapid filter edits into one fetch.
///
/// Each [`update`](Self::update) restarts the quiet period and aborts whatever
/// the previous edit had scheduled or already sent, so a superseded request
/// never delivers its result.
pub struct DebouncedFilter {
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Default for DebouncedFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl DebouncedFilter {
    pub fn new(delay: Duration) -> Self {
        DebouncedFilter {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    pub fn update<F, Fut, T, D>(&self, filter: ProductFilter, fetch: F, deliver: D)
    where
        F: FnOnce(ProductFilter) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        D: FnOnce(T) + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.generation.clone();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let result = fetch(filter).await;
            if current.load(Ordering::SeqCst) == generation {
                deliver(result);
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Drops whatever is scheduled or in flight.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.take() {
                previous.abort();
            }
        }
    }
}

impl Drop for DebouncedFilter {
    fn drop(&mut self) {
        self.cancel();
    }
}
