//! A multi-threaded work queue: a fixed pool of worker threads, each with
//! its own FIFO, fed by round-robin dispatch, with SOFT/HARD shutdown
//! semantics.
//!
//! ```
//! use workqueue::{StopPolicy, WorkQueue};
//!
//! let queue = WorkQueue::create(4, "demo", StopPolicy::Soft).unwrap();
//! queue
//!     .enqueue_sync(0, String::from("hello"), |s: &mut String| {
//!         println!("{s}");
//!     }, None::<fn(String)>)
//!     .unwrap();
//! queue.stop().unwrap();
//! ```

mod error;
mod work_item;
mod worker;
mod workqueue;

pub use error::{Result, WorkqueueError};
pub use work_item::{Disposition, WorkItem};
pub use workqueue::{StopPolicy, WorkQueue};
