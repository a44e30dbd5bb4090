//! Sweep scheduling.
//!
//! A sweep walks one or more sources: fetch the playlist, parse it, then
//! probe and record every stream in order. Streams within a sweep are never
//! probed in parallel.
//!
//! [`Scheduler`] owns two independent entry points:
//! - the periodic full sweep, run once at start and then with a fixed delay
//!   after each completion
//! - on-demand single-source sweeps, each on its own task, bounded by a
//!   semaphore but otherwise unsynchronized with the periodic loop

mod service;
mod sweep;

pub use service::{Scheduler, SchedulerConfig, SweepState};
pub use sweep::{SweepReport, SweepRunner};
