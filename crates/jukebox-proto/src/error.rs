use std::path::PathBuf;

use thiserror::Error;

/// Why a site fetch produced no data. Never surfaced to the user; the
/// resolver logs it and hands back `None`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("could not parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("songs directory not found: {}", .0.display())]
    MissingRoot(PathBuf),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}
