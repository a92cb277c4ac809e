//! Error type shared by the store, the backends, and the dispatcher.

use std::io;

use thiserror::Error;

//-----------------------------------------------------------------------------

/// Errors from case storage and variant backends.
#[derive(Debug, Error)]
pub enum Error {
    /// The variant mode of a case does not match any backend.
    #[error("Unsupported variant mode: {0}")]
    UnsupportedBackend(String),

    /// A backend could not be constructed from its source.
    #[error("Backend unavailable for {location}: {reason}")]
    BackendUnavailable {
        /// Path or URI of the variant source.
        location: String,
        /// What went wrong.
        reason: String,
    },

    /// The filter is not supported by the backend.
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// The filter value cannot be interpreted.
    #[error("Invalid value for filter {name}: {value}")]
    InvalidFilter {
        /// Filter name.
        name: String,
        /// Offending value.
        value: String,
    },

    /// Variant types are `snv` and `sv`.
    #[error("Invalid variant type: {0}")]
    InvalidVariantType(String),

    /// The database URI uses a driver that is not available.
    #[error("Unsupported database driver: {0}")]
    UnsupportedStore(String),

    /// No case with this identifier.
    #[error("Case not found: {0}")]
    CaseNotFound(String),

    /// No individual with this identifier.
    #[error("Individual not found: {0}")]
    IndividualNotFound(String),

    /// Malformed VCF or PED input.
    #[error("Line {line}: {message}")]
    Format {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Passed through from SQLite.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    /// Passed through from file access.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn unavailable<L: ToString, R: ToString>(location: L, reason: R) -> Self {
        Error::BackendUnavailable { location: location.to_string(), reason: reason.to_string() }
    }

    pub(crate) fn invalid_filter(name: &str, value: &str) -> Self {
        Error::InvalidFilter { name: name.to_string(), value: value.to_string() }
    }
}

/// Result type with [`Error`] as the error.
pub type Result<T> = std::result::Result<T, Error>;

//-----------------------------------------------------------------------------
