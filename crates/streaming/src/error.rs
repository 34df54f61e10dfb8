use std::path::PathBuf;
use std::time::Duration;

use formats::FormatError;
use thiserror::Error;

/// Why a remote resource could not be loaded. Always non-fatal to the viewer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
    #[error("overlay data is not valid GeoJSON: {0}")]
    Format(#[from] FormatError),
    #[error("{what} load timed out after {after:?}")]
    Timeout { what: &'static str, after: Duration },
    #[error("invalid resource: {0}")]
    Invalid(String),
}

impl LoadError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
