use std::path::PathBuf;

use thiserror::Error;

use crate::lightblue::RequestFailure;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the errata and LightBlue clients.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP exchange itself failed. Never retried here.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),

    /// LightBlue answered with a non-success status.
    #[error(transparent)]
    Request(#[from] RequestFailure),

    /// The caller passed an event this operation does not understand.
    #[error("unsupported event type: {kind}")]
    UnsupportedEvent { kind: &'static str },

    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{what} file not found: {}", .path.display())]
    MissingFile { what: &'static str, path: PathBuf },

    #[error("invalid client certificate: {0}")]
    Identity(String),
}

impl Error {
    pub fn request_failure(&self) -> Option<&RequestFailure> {
        match self {
            Self::Request(failure) => Some(failure),
            _ => None,
        }
    }
}
