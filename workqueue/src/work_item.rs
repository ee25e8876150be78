//! A unit of deferred work: payload, callable, optional destructor,
//! disposition.
//!
//! The C source this crate is derived from erases the payload type behind
//! `void*` and lets both the callable and the destructor take that same
//! pointer. Rust has no such escape hatch without `unsafe`, so `WorkItem<T>`
//! is generic over its payload and the disposition is reflected in the
//! *type* of the callable it accepts:
//!
//! - [`WorkItem::new_sync`] takes a callable of `FnOnce(&mut T)` — it
//!   borrows the payload, so the engine still owns it once the callable
//!   returns and can hand it to the destructor.
//! - [`WorkItem::new_async`] takes a callable of `FnOnce(T)` — it consumes
//!   the payload outright, which is the Rust-native way to express "hands
//!   the payload to another subsystem" from spec.md §4.1.
//!
//! This is the one place the Rust rewrite must fork spec.md's single
//! `make_work(disposition, ...)` constructor into two; see DESIGN.md.

use std::fmt;

/// Who owns the payload's teardown once the callable has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The engine owns teardown: it calls the destructor (if any) itself,
    /// immediately after the callable returns, or in its place if the
    /// item is skipped by a HARD stop.
    Sync,
    /// The producer/callable owns teardown. The engine never touches the
    /// payload again once the callable has been handed it.
    Async,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Sync => f.write_str("SYNC"),
            Disposition::Async => f.write_str("ASYNC"),
        }
    }
}

pub(crate) enum Invocation<T> {
    Sync {
        callable: Box<dyn FnOnce(&mut T) + Send>,
        destructor: Option<Box<dyn FnOnce(T) + Send>>,
    },
    Async {
        callable: Box<dyn FnOnce(T) + Send>,
    },
}

/// A task to be executed by a worker thread.
///
/// `tag` is an opaque demultiplexing hint carried alongside the payload
/// (spec.md's `user_data_type`); the engine never reads it. It exists for
/// producers that share a single callable across several payload shapes.
/// In idiomatic Rust a closure usually captures whatever context it needs
/// to tell those shapes apart, so most callers can leave it at `0` — it is
/// kept for API fidelity with the source's demultiplexing convention.
pub struct WorkItem<T: Send + 'static> {
    pub(crate) tag: u32,
    pub(crate) disposition: Disposition,
    pub(crate) payload: T,
    pub(crate) invocation: Invocation<T>,
}

impl<T: Send + 'static> WorkItem<T> {
    /// Builds a SYNC work item: the engine calls `destructor` (if any) on
    /// `payload` immediately after `callable` returns, and is responsible
    /// for the payload record either way.
    pub fn new_sync<C, D>(tag: u32, payload: T, callable: C, destructor: Option<D>) -> Self
    where
        C: FnOnce(&mut T) + Send + 'static,
        D: FnOnce(T) + Send + 'static,
    {
        WorkItem {
            tag,
            disposition: Disposition::Sync,
            payload,
            invocation: Invocation::Sync {
                callable: Box::new(callable),
                destructor: destructor.map(|d| Box::new(d) as Box<dyn FnOnce(T) + Send>),
            },
        }
    }

    /// Builds an ASYNC work item: `callable` takes ownership of `payload`
    /// and is solely responsible for its fate. The engine never calls a
    /// destructor for this item and never touches the payload again.
    pub fn new_async<C>(tag: u32, payload: T, callable: C) -> Self
    where
        C: FnOnce(T) + Send + 'static,
    {
        WorkItem {
            tag,
            disposition: Disposition::Async,
            payload,
            invocation: Invocation::Async {
                callable: Box::new(callable),
            },
        }
    }

    /// The demultiplexing tag supplied at construction.
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// SYNC or ASYNC, as supplied at construction.
    pub fn disposition(&self) -> Disposition {
        self.disposition
    }
}

/// Type-erased handle a worker's FIFO stores, so that a single queue can
/// hold `WorkItem<T>` of differing `T`.
///
/// This plays the role the C source gets for free from `void*`: the worker
/// loop never needs to know `T`, only how to run or skip the item it was
/// handed.
pub(crate) trait ErasedWork: Send {
    /// Runs the callable and, for SYNC items, the destructor.
    fn run(self: Box<Self>);

    /// Skips the callable. For SYNC items the destructor still runs (the
    /// HARD-stop path of spec.md §4.2); for ASYNC items the payload is
    /// simply dropped — see DESIGN.md for why this does not attempt to
    /// replicate the C source's literal memory leak.
    fn skip(self: Box<Self>);
}

impl<T: Send + 'static> ErasedWork for WorkItem<T> {
    fn run(self: Box<Self>) {
        let WorkItem {
            mut payload,
            invocation,
            ..
        } = *self;
        match invocation {
            Invocation::Sync {
                callable,
                destructor,
            } => {
                callable(&mut payload);
                if let Some(destructor) = destructor {
                    destructor(payload);
                }
            }
            Invocation::Async { callable } => callable(payload),
        }
    }

    fn skip(self: Box<Self>) {
        let WorkItem {
            payload,
            invocation,
            ..
        } = *self;
        if let Invocation::Sync { destructor, .. } = invocation {
            if let Some(destructor) = destructor {
                destructor(payload);
            }
        }
    }
}
