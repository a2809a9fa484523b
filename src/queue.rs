//! The shared job queue.
//!
//! Descriptors live in an immutable arena; a single atomic cursor hands out
//! indices. `fetch_add` makes every claim exactly-once across any number of
//! workers without a lock, and once the cursor passes the end every later
//! claim sees an empty queue.

use crate::types::ImageDescriptor;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct JobQueue {
    jobs: Vec<ImageDescriptor>,
    cursor: AtomicUsize,
}

impl JobQueue {
    pub fn new(jobs: Vec<ImageDescriptor>) -> Self {
        Self {
            jobs,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Claim the next unclaimed descriptor, or `None` once drained.
    pub fn claim_next(&self) -> Option<&ImageDescriptor> {
        if self.cursor.load(Ordering::Relaxed) >= self.jobs.len() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.jobs.get(index)
    }

    /// Total number of descriptors the queue was built with.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Descriptors not yet claimed.
    pub fn remaining(&self) -> usize {
        self.jobs
            .len()
            .saturating_sub(self.cursor.load(Ordering::Relaxed))
    }
}
