//! Unified error type for the user-stats library.
//!
//! Every fallible operation in the crate returns [`Result`], so callers can
//! propagate failures from decoding, field parsing and file I/O with a
//! single `?`. Configuration loading has its own [`ConfigError`](crate::ConfigError).

use thiserror::Error;

/// Unified error type for all aggregation operations.
///
/// # Example
///
/// ```ignore
/// use user_stats::{Result, StatsConfig, process_data};
///
/// fn run() -> Result<()> {
///     process_data("users.json", "report.json", &StatsConfig::default())?;
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading the collection or writing a report.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input document is not a mapping of identifiers to objects.
    #[error("Failed to decode user collection: {0}")]
    Decode(#[from] serde_json::Error),

    /// A report could not be serialized or written.
    #[error("Failed to write report: {0}")]
    Encode(#[source] serde_json::Error),

    /// A calendar date field did not match `YYYY-MM-DD`.
    #[error("Invalid date in field '{field}': {value}")]
    InvalidDate { field: String, value: String },

    /// A timestamp field could not be interpreted.
    #[error("Invalid timestamp in field '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },

    /// A field holds a value of the wrong kind.
    #[error("Invalid value in field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an [`Error::InvalidField`] for `field`.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Returns `true` if the input document could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns `true` if a record carried a malformed date, timestamp or field.
    pub fn is_bad_record(&self) -> bool {
        matches!(
            self,
            Self::InvalidDate { .. } | Self::InvalidTimestamp { .. } | Self::InvalidField { .. }
        )
    }
}
