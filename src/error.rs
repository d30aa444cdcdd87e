//! Library error type.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid contracts dir: {}", .0.display())]
    ContractsDirNotFound(PathBuf),

    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk contracts dir: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid exclude pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("sphinx build failed: {0}")]
    Build(String),

    #[error("port {} is already in use on {}; pick another with --port", .addr.port(), .addr.ip())]
    PortInUse { addr: SocketAddr },

    #[error(
        "Documentation not found at {}. Build the documentation before serving it.",
        .0.display()
    )]
    DocsNotFound(PathBuf),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
