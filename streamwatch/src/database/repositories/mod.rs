//! Repository layer for database access.
//!
//! The monitor reads sources through [`SourceRepository`] and appends
//! measurements through [`ProbeResultRepository`]. Both are traits so sweeps
//! can run against any store that honours the same contracts.

pub mod probe_result;
pub mod source;

pub use probe_result::*;
pub use source::*;
