//! streamwatch library crate.
//!
//! Periodically probes the streams listed in M3U playlists, records
//! availability, resolution, frame rate and load time as an append-only time
//! series, and snapshots one frame per reachable stream.

pub mod config;
pub mod database;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod logging;
pub mod playlist;
pub mod probe;
pub mod scheduler;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
