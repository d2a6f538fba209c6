//! Progress reporting for long-running summarization.
//!
//! Engines emit `(completed_chunks, total_chunks)` after each chunk is
//! processed. The observer is an infallible callback; emission is also
//! logged via tracing so headless runs stay observable.

use std::sync::Arc;

/// Callback invoked with `(completed, total)` after each chunk.
pub type ProgressObserver = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Progress reporter wrapping an optional observer.
#[derive(Clone)]
pub struct ProgressReporter {
    observer: Option<ProgressObserver>,
}

impl ProgressReporter {
    /// Reporter forwarding to a callback.
    pub fn new(observer: ProgressObserver) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    /// Reporter that only logs.
    pub fn noop() -> Self {
        Self { observer: None }
    }

    /// Wrap an optional observer.
    pub fn from_option(observer: Option<ProgressObserver>) -> Self {
        Self { observer }
    }

    /// Report that `completed` of `total` chunks are done.
    pub fn emit(&self, completed: usize, total: usize) {
        tracing::debug!(completed, total, "Chunk processed");
        if let Some(observer) = &self.observer {
            observer(completed, total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_reporter_emits_to_observer() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);

        let reporter = ProgressReporter::new(Arc::new(move |completed, total| {
            events_clone.lock().unwrap().push((completed, total));
        }));

        reporter.emit(1, 3);
        reporter.emit(2, 3);

        assert_eq!(*events.lock().unwrap(), vec![(1, 3), (2, 3)]);
    }

    #[test]
    fn test_noop_reporter() {
        let reporter = ProgressReporter::noop();
        reporter.emit(1, 1); // Should not panic
    }
}
