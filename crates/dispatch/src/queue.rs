//! Bounded drop-oldest job queue
//!
//! tokio's mpsc channel cannot drop the *oldest* element on overflow, so the
//! dispatch queue is a mutex-guarded deque with a `Notify` for the single
//! consumer. Push never blocks and never fails: at capacity the oldest job
//! makes room for the newest.

use std::collections::VecDeque;

use courier_protocol::Job;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Result of a push
#[derive(Debug)]
pub enum Push {
    /// Job enqueued, capacity permitting
    Queued,
    /// Queue was full; the returned oldest job was evicted
    DroppedOldest(Box<Job>),
    /// Queue is closed; the job is handed back
    Closed(Box<Job>),
}

struct Inner {
    jobs: VecDeque<Job>,
    closed: bool,
}

/// One target's bounded FIFO queue
///
/// Single consumer: exactly one worker calls [`JobQueue::pop`].
pub struct JobQueue {
    capacity: usize,
    inner: Mutex<Inner>,
    notify: Notify,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` jobs
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                jobs: VecDeque::new(),
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Enqueue a job at the tail, evicting the oldest when full
    ///
    /// O(1), never blocks.
    pub fn push(&self, job: Job) -> Push {
        let dropped = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Push::Closed(Box::new(job));
            }

            let dropped = if inner.jobs.len() >= self.capacity {
                inner.jobs.pop_front()
            } else {
                None
            };
            inner.jobs.push_back(job);
            dropped
        };

        self.notify.notify_one();

        match dropped {
            Some(job) => Push::DroppedOldest(Box::new(job)),
            None => Push::Queued,
        }
    }

    /// Dequeue the next job, waiting until one is available
    ///
    /// Returns `None` once the queue is closed *and* drained, which is the
    /// worker's signal to exit.
    pub async fn pop(&self) -> Option<Job> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a close or push between
            // the check and the await still wakes us.
            notified.as_mut().enable();

            {
                let mut inner = self.inner.lock();
                if let Some(job) = inner.jobs.pop_front() {
                    return Some(job);
                }
                if inner.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Close the queue: pushes are rejected, pops drain what remains
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    /// Jobs currently queued
    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    /// Check whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().jobs.is_empty()
    }

    /// Whether the queue has been closed
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// The configured capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
