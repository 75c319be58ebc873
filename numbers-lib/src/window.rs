use crate::fifo_set::FifoSet;
use parking_lot::Mutex;
use tracing::trace;

pub const DEFAULT_WINDOW_CAPACITY: usize = 10;

/// Window contents captured right before and right after one ingested batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowSnapshot {
    pub prev: Vec<i64>,
    pub curr: Vec<i64>,
}

/// Outcome of a single [`WindowStore::ingest`] call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestOutcome {
    pub snapshot: WindowSnapshot,
    /// Values from the batch that were appended to the window.
    pub appended: usize,
    /// Values pushed out of the window to make room.
    pub evicted: Vec<i64>,
}

/// Bounded, deduplicated, insertion-ordered window of observed numbers.
///
/// The lock is held for the whole batch, so concurrent requests cannot
/// interleave their appends or observe a half-ingested window.
#[derive(Debug)]
pub struct WindowStore {
    window: Mutex<FifoSet<i64>>,
}

impl WindowStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Mutex::new(FifoSet::new(capacity)),
        }
    }

    pub fn ingest(&self, batch: &[i64]) -> IngestOutcome {
        let mut window = self.window.lock();
        let prev = window.to_vec();

        let mut appended = 0;
        let mut evicted = Vec::new();
        for &number in batch {
            let (inserted, pushed_out) = window.insert_evicting(number);
            if inserted {
                appended += 1;
            }
            evicted.extend(pushed_out);
        }

        let curr = window.to_vec();
        drop(window);

        trace!(
            batch = batch.len(),
            appended,
            evicted = evicted.len(),
            "window ingested batch"
        );

        IngestOutcome {
            snapshot: WindowSnapshot { prev, curr },
            appended,
            evicted,
        }
    }

    pub fn snapshot(&self) -> Vec<i64> {
        self.window.lock().to_vec()
    }

    pub fn len(&self) -> usize {
        self.window.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.window.lock().capacity()
    }
}

impl Default for WindowStore {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
