// Error types for the static data bridge.
// Covers data source failures, cache I/O, JSON decoding, and path lookup errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("data fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("data source returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("data source error: {0}")]
    Source(Box<dyn std::error::Error + Send + Sync>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache artifact not found at {0} (were paths enumerated first?)")]
    CacheMissing(PathBuf),

    #[error("no cache directory available; set STATIC_DATA_CACHE_DIR")]
    NoCacheDir,

    #[error("no cache location configured for this bridge")]
    NoCache,

    #[error("request has no `{0}` param")]
    MissingParam(String),

    #[error("record {index} has no usable path key")]
    InvalidKey { index: usize },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an arbitrary error raised by a caller-supplied fetcher or transformer.
    pub fn boxed<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Source(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
