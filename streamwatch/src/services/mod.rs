//! Service layer module.
//!
//! This module provides the service container that wires the monitor
//! together.

pub mod container;

pub use container::ServiceContainer;
