#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A value wrapper that reports every lifecycle event and every call made on it, to help
//! debug object lifetime and concurrency issues.
//!
//! The core functionality includes:
//! - [`Reporter`] - Holds a heap-allocated value and writes one diagnostic line for each
//!   construction, copy, move, assignment, call and destruction
//! - [`Registry`] - Allocates unique ids and serializes the output of a group of reporters
//! - [`Sink`] - Receives the diagnostic lines; see [`StderrSink`], [`MemorySink`] and
//!   [`WriterSink`]
//!
//! This package is not meant for use in production, serving only as a development tool.
//!
//! # Output format
//!
//! Every event produces exactly one line:
//!
//! ```text
//! [<type-hash>, <thread-hash>, <id>, 0x<address>, <value>]: <operation>
//! ```
//!
//! * `type-hash` - stable hash of the element type, 5 decimal digits.
//! * `thread-hash` - hash of the thread that performed the operation, 5 decimal digits.
//! * `id` - id of the reporter, at least 5 decimal digits.
//! * `address` - address of the held value in hexadecimal, all zeroes if the reporter has
//!   been moved from.
//! * `value` - the held value as an unsigned number, at least 5 decimal digits, zero if the
//!   reporter has been moved from.
//! * `operation` - name of the operation, e.g. `Reporter::clone(&self)`.
//!
//! # Lifecycle
//!
//! | Operation            | API                                                   |
//! |----------------------|-------------------------------------------------------|
//! | Construction         | [`Reporter::new()`], [`Reporter::with_sink()`]        |
//! | Copy construction    | [`Reporter::try_clone()`], [`Clone::clone()`]         |
//! | Move construction    | [`Reporter::take()`]                                  |
//! | Copy assignment      | [`Reporter::try_assign()`], [`Clone::clone_from()`]   |
//! | Move assignment      | [`Reporter::try_assign_take()`]                       |
//! | Call                 | [`Reporter::call()`], [`Reporter::call_mut()`], [`Reporter::call_once()`], [`Reporter::invoke()`] |
//! | Destruction          | `Drop`                                                |
//!
//! Moves in Rust are invisible to the moved value, so move construction is an explicit
//! operation that leaves the source reporter invalidated, much like [`Option::take()`].
//!
//! # Example
//!
//! ```
//! use lifecycle_reporter::Reporter;
//!
//! let mut r1 = Reporter::<u64>::new();
//! let mut r2 = r1.clone();
//! let mut r3 = r2.clone();
//! let mut r4 = r1.take();
//! let mut r5 = Reporter::<u64>::new();
//!
//! r1.call_mut(());
//! r2.call_mut(());
//! r3.call_mut(());
//! r4.call_mut(());
//! r5.call_mut(());
//!
//! // Destruction of all five is reported when they go out of scope.
//! ```
//!
//! # Thread safety
//!
//! Reporters can be created, called and dropped from any number of threads. All reporters
//! of a registry share one lock, which guarantees unique ids and whole, non-interleaved
//! lines. [`Reporter::new()`] uses a process-wide registry per element type; create a
//! separate [`Registry`] to isolate a group of reporters, for example in a test.

mod error;
mod record;
mod registry;
mod reporter;
mod sink;
mod slot;
mod value;

pub use error::*;
pub use record::{Access, Category, Operation, Qualifier};
pub use registry::*;
pub use reporter::*;
pub use sink::*;
pub use value::*;
