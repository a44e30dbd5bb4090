//! Database models.
//!
//! These models map directly to the database schema.

pub mod probe_result;
pub mod source;

pub use probe_result::*;
pub use source::*;
