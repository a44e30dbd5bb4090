//! Playlist retrieval and parsing.
//!
//! A sweep turns each source URL into an ordered list of
//! [`StreamDescriptor`](crate::domain::StreamDescriptor)s: the fetcher
//! downloads the text, the parser extracts the entries. Neither step fails
//! the sweep; an unreachable or malformed playlist yields fewer entries.

mod fetcher;
mod parser;

pub use fetcher::{FetchError, PlaylistFetcher};
pub use parser::{DIRECTIVE_PREFIX, parse_playlist};
