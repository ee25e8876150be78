//! The pool: owns a fixed set of [`Worker`]s and round-robin dispatches
//! enqueued work across them.
//!
//! Grounded on `cd_wq_create`/`cd_wq_work_enqueue`/`cd_wq_stop` in the C
//! source. The original keeps `workers_active_n` and
//! `next_worker_index_to_use` as plain `uint32_t` fields on the queue
//! struct with no lock of their own (spec.md §9, open question 1); this
//! crate folds both into one [`Mutex<DispatchState>`] so `enqueue` is sound
//! when called from more than one producer thread, which the original's
//! single-producer assumption never had to justify.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{Result, WorkqueueError};
use crate::work_item::WorkItem;
use crate::worker::Worker;

/// What a worker does with its remaining queued items once stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopPolicy {
    /// Drain every queued item before the worker exits.
    Soft,
    /// Finish the item in flight, then skip (but still destruct, for SYNC
    /// items) everything still queued.
    Hard,
}

struct DispatchState {
    /// Workers whose thread is actually running. Shrinks only when a
    /// worker fails to start at construction time; `stop` does not touch
    /// it, since a stopped worker still accepts and drains its queue under
    /// SOFT policy.
    workers_active_n: usize,
    next_worker_index_to_use: usize,
}

/// A fixed pool of worker threads with round-robin dispatch.
pub struct WorkQueue {
    name: String,
    workers: Vec<Worker>,
    dispatch: Mutex<DispatchState>,
    stop_policy: StopPolicy,
    stopped: AtomicUsize,
}

impl WorkQueue {
    /// Starts `worker_count` worker threads under `stop_policy`, labelled
    /// `name` for logging (spec.md §3's `name` field, copied here as an
    /// owned `String` the way `cd_wq_create` copies its `const char *name`
    /// argument).
    ///
    /// Returns [`WorkqueueError::BadCall`] if `worker_count` is zero, and
    /// [`WorkqueueError::WorkqueueCreate`] if not a single worker thread
    /// could be started (spec.md §4.3: individual start failures are
    /// tolerated as long as at least one worker is left running).
    pub fn create(
        worker_count: usize,
        name: impl Into<String>,
        stop_policy: StopPolicy,
    ) -> Result<WorkQueue> {
        if worker_count == 0 {
            return Err(WorkqueueError::BadCall);
        }
        let name = name.into();

        let workers: Vec<Worker> = (0..worker_count)
            .map(|index| Worker::new(index, stop_policy))
            .collect();

        let workers_active_n = workers.iter().filter(|w| w.started()).count();
        if workers_active_n == 0 {
            log::error!("workqueue '{name}': no worker thread could be started out of {worker_count}");
            return Err(WorkqueueError::WorkqueueCreate);
        }
        if workers_active_n < worker_count {
            log::warn!(
                "workqueue '{name}': only {workers_active_n}/{worker_count} worker threads started"
            );
        }

        Ok(WorkQueue {
            name,
            workers,
            dispatch: Mutex::new(DispatchState {
                workers_active_n,
                next_worker_index_to_use: 0,
            }),
            stop_policy,
            stopped: AtomicUsize::new(0),
        })
    }

    /// Convenience constructor matching `cd_wq_default_create`: `worker_count`
    /// threads under [`StopPolicy::Soft`].
    pub fn default_create(worker_count: usize, name: impl Into<String>) -> Result<WorkQueue> {
        Self::create(worker_count, name, StopPolicy::Soft)
    }

    /// The label this queue was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of workers whose thread is currently running.
    pub fn active_workers(&self) -> usize {
        self.dispatch.lock().unwrap().workers_active_n
    }

    /// The stop policy this queue was created with.
    pub fn stop_policy(&self) -> StopPolicy {
        self.stop_policy
    }

    /// Enqueues `item`, dispatching it to the next eligible worker in
    /// round-robin order, and returns that worker's index.
    ///
    /// Mirrors `cd_wq_work_enqueue`'s scan: starting from
    /// `next_worker_index_to_use`, advance (wrapping) until a started
    /// worker is found, bailing out with [`WorkqueueError::Fail`] after
    /// `workers.len()` probes rather than spinning forever should every
    /// worker have failed to start after all (it cannot today, since
    /// `create` refuses to return a queue with zero active workers, but
    /// the bound is kept as the source keeps its `0xFF` sanity cap).
    ///
    /// On any error the item is handed back to the caller rather than
    /// dropped: spec.md §7/§8 is explicit that on `WORKQUEUE_ACTIVE` "the
    /// work item is untouched" and "the caller must free it" — ownership
    /// never transfers to the engine unless dispatch actually succeeds.
    pub fn enqueue<T: Send + 'static>(
        &self,
        item: WorkItem<T>,
    ) -> std::result::Result<usize, (WorkqueueError, WorkItem<T>)> {
        let mut dispatch = self.dispatch.lock().unwrap();
        if dispatch.workers_active_n == 0 {
            drop(dispatch);
            return Err((WorkqueueError::WorkqueueActive, item));
        }

        let worker_count = self.workers.len();
        let target = if dispatch.workers_active_n == 1 {
            match self.workers.iter().position(|w| w.started()) {
                Some(target) => target,
                None => {
                    drop(dispatch);
                    return Err((WorkqueueError::Fail, item));
                }
            }
        } else {
            let mut index = dispatch.next_worker_index_to_use;
            let mut probes = 0;
            loop {
                if probes >= worker_count {
                    drop(dispatch);
                    return Err((WorkqueueError::Fail, item));
                }
                if self.workers[index].started() {
                    break index;
                }
                index = (index + 1) % worker_count;
                probes += 1;
            }
        };

        dispatch.next_worker_index_to_use = (target + 1) % worker_count;
        drop(dispatch);

        self.workers[target].push(Box::new(item));
        Ok(target)
    }

    /// Convenience wrapper for a SYNC item built and enqueued in one call.
    pub fn enqueue_sync<T, C, D>(
        &self,
        tag: u32,
        payload: T,
        callable: C,
        destructor: Option<D>,
    ) -> Result<usize>
    where
        T: Send + 'static,
        C: FnOnce(&mut T) + Send + 'static,
        D: FnOnce(T) + Send + 'static,
    {
        self.enqueue(WorkItem::new_sync(tag, payload, callable, destructor))
            .map_err(|(err, _)| err)
    }

    /// Convenience wrapper for an ASYNC item built and enqueued in one call.
    pub fn enqueue_async<T, C>(&self, tag: u32, payload: T, callable: C) -> Result<usize>
    where
        T: Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        self.enqueue(WorkItem::new_async(tag, payload, callable))
            .map_err(|(err, _)| err)
    }

    /// Requests every worker to stop, then joins all worker threads.
    ///
    /// Idempotent: calling `stop` more than once (or letting `Drop` call it
    /// after an explicit call already did) only joins each thread once.
    /// Takes `&self` rather than `&mut self` so a queue shared across
    /// producer threads (e.g. behind an `Arc`) can still be stopped from
    /// any of them.
    pub fn stop(&self) -> Result<()> {
        if self.stopped.swap(1, Ordering::SeqCst) == 1 {
            return Ok(());
        }

        for worker in &self.workers {
            worker.request_stop();
        }

        let mut first_err = None;
        for worker in &self.workers {
            if let Err(err) = worker.join() {
                log::error!(
                    "workqueue '{}': worker {} failed to join: {err}",
                    self.name,
                    worker.index()
                );
                first_err.get_or_insert(err);
            }
        }

        // Every worker's thread has now exited (or failed to join, which
        // leaves it unrecoverable either way): none of them are valid
        // dispatch targets any more. Without this, `enqueue` would keep
        // reading a stale `workers_active_n` from `create` and silently
        // push items into a FIFO nobody will ever drain again.
        self.dispatch.lock().unwrap().workers_active_n = 0;

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::error!("workqueue '{}': error stopping queue during drop: {err}", self.name);
        }
    }
}
