//! Error types for table construction and layout validation.
//!
//! Every variant describes a build-time invariant violation. None of them are
//! recoverable within a run: the caller fixes the input or configuration and
//! rebuilds from scratch.

use thiserror::Error;

/// Result type alias for table operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Table construction errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A bucket index does not fit in the configured offset width.
    #[error("offset overflow at level {level}: index {index} does not fit in {bits} bits")]
    OffsetOverflow { level: usize, index: usize, bits: u8 },

    /// A packed index does not fit in its offset width.
    #[error("index {index} at position {position} does not fit in {bits} bits")]
    IndexTooWide { position: usize, index: usize, bits: u8 },

    /// A final-level bucket holds more than one width class.
    #[error("final level bucket {bucket} is not class-homogeneous")]
    NonHomogeneousBucket { bucket: usize },

    /// A final-level bucket holds no entries at all.
    #[error("final level bucket {bucket} is empty")]
    EmptyBucket { bucket: usize },

    /// Cascade configuration is inconsistent.
    #[error("invalid cascade configuration: {0}")]
    InvalidConfig(String),

    /// Offset width outside {2, 4, 8}.
    #[error("invalid offset width {0}: must be 2, 4, or 8 bits")]
    InvalidOffsetWidth(u8),

    /// Classified array length disagrees with the configured domain.
    #[error("domain size mismatch: expected {expected} values, got {actual}")]
    DomainMismatch { expected: usize, actual: usize },

    /// Upstream property record is out of order, overlapping, or out of range.
    #[error("malformed upstream record {record}: {message}")]
    MalformedRecord { record: usize, message: String },

    /// Packed layout failed validation.
    #[error("corrupted table: {message}")]
    CorruptedTable { message: String },

    /// Layout version not understood by this decoder.
    #[error("layout version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

impl Error {
    /// Create an invalid configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }

    /// Create a corrupted table error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Error::CorruptedTable {
            message: message.into(),
        }
    }

    /// Create a corrupted table error with level context.
    pub fn corrupted_at(message: impl Into<String>, level: usize) -> Self {
        Error::CorruptedTable {
            message: format!("{} at level {}", message.into(), level),
        }
    }

    /// Create a malformed record error.
    pub fn malformed(record: usize, message: impl Into<String>) -> Self {
        Error::MalformedRecord {
            record,
            message: message.into(),
        }
    }

    /// Create an offset overflow error.
    pub fn offset_overflow(level: usize, index: usize, bits: u8) -> Self {
        Error::OffsetOverflow { level, index, bits }
    }

    /// Get error category for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Error::OffsetOverflow { .. } => "offset_overflow",
            Error::IndexTooWide { .. } => "index_too_wide",
            Error::NonHomogeneousBucket { .. } => "non_homogeneous_bucket",
            Error::EmptyBucket { .. } => "empty_bucket",
            Error::InvalidConfig(_) => "invalid_config",
            Error::InvalidOffsetWidth(_) => "invalid_offset_width",
            Error::DomainMismatch { .. } => "domain_mismatch",
            Error::MalformedRecord { .. } => "malformed_record",
            Error::CorruptedTable { .. } => "corrupted_table",
            Error::VersionMismatch { .. } => "version_mismatch",
        }
    }
}
