//! One OS thread, one FIFO, one mutex + condition variable.
//!
//! Grounded on `cd_wq_worker_f`/`cd_wq_worker_init` in the C source, with
//! the worker's queue and `active` flag sharing a single lock exactly as
//! `struct cd_worker`'s `mutex` does, and on the `Worker`/`Drop` shape of
//! `labs/29-thread-pool`'s `ThreadPool` for the join-on-teardown idiom.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::{Result, WorkqueueError};
use crate::work_item::ErasedWork;
use crate::workqueue::StopPolicy;

struct WorkerState {
    queue: VecDeque<Box<dyn ErasedWork>>,
    /// `true` between a successful start and a stop request. Guarded by
    /// the same mutex as `queue` so a wake-up can never observe a `queue`
    /// append without also observing the `active` flag change that might
    /// accompany it.
    active: bool,
}

struct WorkerShared {
    index: usize,
    state: Mutex<WorkerState>,
    signal: Condvar,
    stop_policy: StopPolicy,
}

/// A single worker thread bound to its own FIFO.
pub(crate) struct Worker {
    index: usize,
    /// Whether the worker's thread was actually started. Unlike `active`
    /// (which the running thread clears on stop) this never changes once
    /// set, so the round-robin scan can read it without locking anything.
    started: bool,
    thread: Mutex<Option<JoinHandle<()>>>,
    shared: Arc<WorkerShared>,
}

impl Worker {
    /// Creates worker `index` and attempts to start its thread. The slot
    /// is returned either way so indices stay stable across the pool even
    /// when a thread fails to spawn (spec.md §4.3).
    pub(crate) fn new(index: usize, stop_policy: StopPolicy) -> Worker {
        // `active` starts true so a thread that does spawn never races its
        // own loop against the flag being set after the fact: by the time
        // any thread could observe `state`, it is already correct.
        let shared = Arc::new(WorkerShared {
            index,
            state: Mutex::new(WorkerState {
                queue: VecDeque::new(),
                active: true,
            }),
            signal: Condvar::new(),
            stop_policy,
        });

        let thread = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(format!("workqueue-worker-{index}"))
                .spawn(move || Worker::run(shared))
                .ok()
        };

        let started = thread.is_some();
        if !started {
            log::warn!("workqueue: worker {index} failed to start its thread");
        }

        Worker {
            index,
            started,
            thread: Mutex::new(thread),
            shared,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Whether this worker's thread is running and a valid dispatch target.
    pub(crate) fn started(&self) -> bool {
        self.started
    }

    /// Appends `item` to this worker's FIFO and wakes it.
    pub(crate) fn push(&self, item: Box<dyn ErasedWork>) {
        let mut state = self.shared.state.lock().unwrap();
        state.queue.push_back(item);
        drop(state);
        self.shared.signal.notify_one();
    }

    /// Clears the `active` flag and wakes the worker so it re-checks its
    /// stop predicate. Does not block.
    pub(crate) fn request_stop(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.active = false;
        drop(state);
        self.shared.signal.notify_one();
    }

    /// Joins the worker's thread, if it hasn't been joined already.
    /// Idempotent: joining twice is a no-op returning `Ok`.
    ///
    /// `run` only ever breaks its outer loop once its FIFO is empty (SOFT
    /// drains it, HARD skips through it), so a successfully joined thread
    /// should never leave anything behind. If it does, that is exactly the
    /// "worker deinit requested while queue non-empty" programming error
    /// spec.md §7 reserves [`WorkqueueError::Busy`] for.
    pub(crate) fn join(&self) -> Result<()> {
        let handle = self.thread.lock().unwrap().take();
        match handle {
            Some(handle) => {
                handle.join().map_err(|_| WorkqueueError::Fail)?;
                if !self.shared.state.lock().unwrap().queue.is_empty() {
                    log::error!(
                        "workqueue: worker {} joined with a non-empty queue",
                        self.index
                    );
                    return Err(WorkqueueError::Busy);
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn run(shared: Arc<WorkerShared>) {
        let mut state = shared.state.lock().unwrap();
        loop {
            while let Some(item) = state.queue.pop_front() {
                let hard_stop = !state.active && shared.stop_policy == StopPolicy::Hard;
                drop(state);
                if hard_stop {
                    item.skip();
                } else {
                    item.run();
                }
                state = shared.state.lock().unwrap();
            }

            if !state.active {
                break;
            }

            state = shared.signal.wait(state).unwrap();
        }
        log::debug!("workqueue: worker {} exiting", shared.index);
    }
}
