// std imports
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Progress and cancellation handle for bulk storage operations.
/// Shared between the requesting thread and the thread driving the
/// operation, usually wrapped in an `Arc`.
///
#[derive(Debug, Default)]
pub struct ProgressSink {
    /// Cooperative cancellation flag, polled between table batches
    canceled: AtomicBool,
    /// Number of processed records
    position: AtomicU64,
    /// Expected number of records
    total: AtomicU64,
}

impl ProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Running bulk operations stop at the next
    /// table boundary, leaving a partially warmed cache.
    ///
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Relaxed)
    }

    /// Sets the expected number of records
    ///
    /// # Arguments
    /// * `total` - Number of records the operation is going to touch
    ///
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Advances the position by one record
    ///
    pub fn increment(&self) {
        self.increase(1);
    }

    /// Advances the position by the given number of records
    ///
    /// # Arguments
    /// * `amount` - Number of processed records
    ///
    pub fn increase(&self, amount: u64) {
        self.position.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    // std imports
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_cancellation_is_visible_across_threads() {
        let sink = Arc::new(ProgressSink::new());
        assert!(!sink.is_canceled());

        let thread_sink = sink.clone();
        let handle = thread::spawn(move || {
            thread_sink.cancel();
        });
        handle.join().unwrap();

        assert!(sink.is_canceled());
    }

    #[test]
    fn test_position_accumulates() {
        let sink = ProgressSink::new();
        sink.set_total(10);
        sink.increment();
        sink.increase(4);

        assert_eq!(sink.total(), 10);
        assert_eq!(sink.position(), 5);
    }
}
