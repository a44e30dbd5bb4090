//! Shared helpers.

pub mod filename;
