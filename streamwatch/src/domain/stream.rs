//! Stream descriptor value object.

use serde::{Deserialize, Serialize};

/// A stream entry parsed from a playlist.
///
/// Descriptors are rebuilt on every sweep and never stored on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Display name (text after the last comma of the directive line).
    pub name: String,
    /// Media URL handed to the probe tool.
    pub url: String,
    /// Value of the `tvg-logo` attribute, if present.
    pub logo_url: Option<String>,
}

impl StreamDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            logo_url: None,
        }
    }

    pub fn with_logo(mut self, logo_url: impl Into<String>) -> Self {
        self.logo_url = Some(logo_url.into());
        self
    }
}
