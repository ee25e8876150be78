//! Error taxonomy returned at the public API boundary.
//!
//! Mirrors `enum cd_error` from the C source this crate is derived from:
//! small, flat, and returned rather than thrown. Engine-internal invariant
//! violations are logged at the call site (see [`crate::workqueue`]) in
//! addition to being returned here, so a caller that ignores the `Result`
//! still leaves a trace.

use thiserror::Error;

/// Failure kinds surfaced by [`crate::WorkQueue`] and [`crate::WorkItem`].
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum WorkqueueError {
    /// A worker thread failed to join, or another OS-level teardown error.
    #[error("operation failed")]
    Fail,
    /// A worker's thread exited but its FIFO was still non-empty.
    /// `Worker::run` only ever breaks out once it has drained (SOFT) or
    /// skipped (HARD) everything queued, so `WorkQueue::stop` surfacing
    /// this indicates a programming error, not a normal race.
    #[error("worker is still busy")]
    Busy,
    /// Allocation failure. Reserved for API compatibility with the source
    /// taxonomy; Rust's global allocator aborts on OOM rather than
    /// returning this, so it is never produced by this crate today.
    #[error("allocation failed")]
    Mem,
    /// `WorkQueue::create` could not start a single worker thread.
    #[error("no worker threads could be started")]
    WorkqueueCreate,
    /// `enqueue` was called on a queue with zero active workers.
    #[error("workqueue has no active workers")]
    WorkqueueActive,
    /// A required argument was missing or invalid.
    #[error("invalid argument")]
    BadCall,
}

/// Convenience alias used throughout this crate's public API.
pub type Result<T> = std::result::Result<T, WorkqueueError>;
