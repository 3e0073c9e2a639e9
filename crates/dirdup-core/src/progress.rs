//! Progress reporting and cancellation
//!
//! The completed-task counter is the only mutable state shared between
//! rewrite tasks. Incrementing it and notifying the caller happen under one
//! lock, so the caller observes `1..=total` in order with no interleaving.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Snapshot of a batch's progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Tasks finished, with any outcome
    pub completed: usize,
    /// Tasks scheduled
    pub total: usize,
}

impl Progress {
    /// Completed share in `0.0..=1.0`; an empty batch is complete
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// True once every task has finished
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Caller-supplied progress callback
pub type ProgressSink = Arc<dyn Fn(Progress) + Send + Sync>;

/// Mutex-guarded completion counter
pub struct ProgressTracker {
    total: usize,
    completed: Mutex<usize>,
    sink: Option<ProgressSink>,
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total", &self.total)
            .field("completed", &*self.completed.lock())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl ProgressTracker {
    /// Create tracker for `total` tasks
    #[inline]
    #[must_use]
    pub fn new(total: usize, sink: Option<ProgressSink>) -> Self {
        Self {
            total,
            completed: Mutex::new(0),
            sink,
        }
    }

    /// Record one finished task and notify the sink
    ///
    /// The sink runs while the counter lock is held.
    pub fn advance(&self) -> Progress {
        let mut completed = self.completed.lock();
        *completed += 1;
        let progress = Progress {
            completed: *completed,
            total: self.total,
        };
        if let Some(sink) = &self.sink {
            sink(progress);
        }
        progress
    }

    /// Current progress
    #[must_use]
    pub fn snapshot(&self) -> Progress {
        Progress {
            completed: *self.completed.lock(),
            total: self.total,
        }
    }
}

/// Shared cancellation flag checked before each task starts
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create unset flag
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; tasks already running finish normally
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once cancellation was requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_reports_through_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: ProgressSink = Arc::new(move |p| sink_seen.lock().push(p.completed));

        let tracker = ProgressTracker::new(3, Some(sink));
        for _ in 0..3 {
            tracker.advance();
        }
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
        assert!(tracker.snapshot().is_complete());
    }

    #[test]
    fn concurrent_advances_are_strictly_increasing() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: ProgressSink = Arc::new(move |p| sink_seen.lock().push(p.completed));
        let tracker = Arc::new(ProgressTracker::new(400, Some(sink)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        tracker.advance();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let seen = seen.lock();
        assert_eq!(*seen, (1..=400).collect::<Vec<_>>());
    }

    #[test]
    fn fraction_and_display() {
        let progress = Progress {
            completed: 1,
            total: 4,
        };
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);
        assert_eq!(progress.to_string(), "1/4");
        assert!((Progress::default().fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }
}
