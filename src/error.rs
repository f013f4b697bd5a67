//! Error kinds raised by the catalog, membership and circulation components.
//! The HTTP layer is the only place that turns them into status codes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    BookNotAvailable(String),
    #[error("{0}")]
    BorrowerNotActive(String),
    #[error("{0}")]
    InvalidOperation(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(anyhow::Error),
}

impl LibraryError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LibraryError::Validation(_) => "validation",
            LibraryError::NotFound(_) => "resource-not-found",
            LibraryError::Duplicate(_) => "duplicate-resource",
            LibraryError::BookNotAvailable(_) => "book-not-available",
            LibraryError::BorrowerNotActive(_) => "borrower-not-active",
            LibraryError::InvalidOperation(_) => "invalid-operation",
            LibraryError::Conflict(_) => "conflict",
            LibraryError::Unexpected(_) => "unexpected",
        }
    }
}

/// The persistence layer speaks `anyhow` and may tunnel a typed kind through
/// it (unique violations become `Duplicate`); recover that kind here.
impl From<anyhow::Error> for LibraryError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<LibraryError>() {
            Ok(kind) => kind,
            Err(err) => LibraryError::Unexpected(err),
        }
    }
}

impl From<garde::Report> for LibraryError {
    fn from(report: garde::Report) -> Self {
        LibraryError::Validation(report.to_string())
    }
}

/// Result type returned by every component operation.
pub type AppResult<T> = Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Context};

    use super::*;

    #[test]
    fn typed_kinds_survive_an_anyhow_round_trip() {
        let tunneled = anyhow::Error::from(LibraryError::Duplicate("isbn taken".into()));
        let err = LibraryError::from(tunneled);
        assert!(matches!(err, LibraryError::Duplicate(ref msg) if msg == "isbn taken"));
    }

    #[test]
    fn kinds_behind_context_are_recovered() {
        let result: anyhow::Result<()> =
            Err(anyhow::Error::from(LibraryError::Conflict("busy".into())));
        let err = LibraryError::from(result.context("failed to delete").unwrap_err());
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn plain_failures_are_unexpected() {
        let err = LibraryError::from(anyhow!("disk on fire"));
        assert_eq!(err.kind(), "unexpected");
    }
}
