//! Domain layer.
//!
//! Values that flow through a sweep: descriptors parsed from a playlist and
//! the measurement produced for each of them.

mod probe;
mod stream;

pub use probe::ProbeResult;
pub use stream::StreamDescriptor;
