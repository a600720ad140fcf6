//! Error types shared by the fetch pipeline.
//!
//! Every failure is terminal for a run. Library code returns these as values;
//! only the binary turns them into a process exit code.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which request of a job failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// One-off request for a whole resource (countries, parameters, locations).
    Single,
    /// The `limit=1` request used to read `meta.found`.
    Probe,
    /// A bulk page, 1-based.
    Page(u32),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Single => write!(f, "request"),
            Stage::Probe => write!(f, "probe request"),
            Stage::Page(i) => write!(f, "page {i}"),
        }
    }
}

/// Failure of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS, connect, TLS or timeout failure.
    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response.
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Body was not valid JSON.
    #[error("could not decode JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors surfaced by the fetch pipeline.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{endpoint}: {stage} failed")]
    RemoteFetchFailed {
        endpoint: String,
        stage: Stage,
        #[source]
        source: TransportError,
    },

    #[error("{endpoint}: unexpected response shape: {detail}")]
    InvalidResponseShape { endpoint: String, detail: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("filesystem error at {path}: {source}")]
    FilesystemFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::FilesystemFailure {
            path: path.into(),
            source,
        }
    }

    /// Page index carried by a failed bulk request, if any.
    pub fn failed_page(&self) -> Option<u32> {
        match self {
            FetchError::RemoteFetchFailed {
                stage: Stage::Page(i),
                ..
            } => Some(*i),
            _ => None,
        }
    }
}
