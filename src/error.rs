//! Error type shared by every query in the persistence layer. Each variant
//! carries enough information for a web layer to pick a response status
//! without having to inspect the message text.

use thiserror::Error;

/// Convenience alias used by the data-access functions.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A lookup by id or by name matched no row.
    #[error("{0}")]
    NotFound(String),
    /// Anything SQLite reports: connectivity, constraint violations, malformed
    /// SQL. Passed through untouched.
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
    /// The data directory could not be created.
    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
    /// The background connection thread is gone, either because the handle
    /// was closed or because a query panicked on it.
    #[error("database connection closed")]
    ConnectionClosed,
}

impl Error {
    /// HTTP-style status code for the error.
    pub fn status(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::Storage(_) | Error::Io(_) | Error::ConnectionClosed => 500,
        }
    }

    /// True for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Flatten a `tokio-rusqlite` error so that SQLite's own error still
    /// arrives as [`Error::Storage`].
    pub(crate) fn from_call(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(err) => Error::Storage(err),
            tokio_rusqlite::Error::Close((_, err)) => Error::Storage(err),
            tokio_rusqlite::Error::ConnectionClosed => Error::ConnectionClosed,
            #[allow(unreachable_patterns)]
            _ => Error::ConnectionClosed,
        }
    }
}
