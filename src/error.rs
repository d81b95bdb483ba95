use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    /// The activity log does not exist yet. Callers treat this as a clean early exit.
    #[error("log file not found: {0:?}")]
    MissingInput(PathBuf),

    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to save geolocation cache to {path:?}")]
    CacheSave {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reasons a single geolocation lookup can fail. The resolver never surfaces
/// these; they only end up in logs.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {0}")]
    Status(u16),

    #[error("service rejected the query: {0}")]
    Rejected(String),

    #[error("response has no country")]
    MissingCountry,
}
