//! Playlist source database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A playlist location to sweep.
///
/// Rows are created and edited outside the monitor; the monitor only reads them.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SourceDbModel {
    pub id: i64,
    pub name: String,
    /// Playlist URL. Only http(s) locations are fetched.
    pub url: String,
}
