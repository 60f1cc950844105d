//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::types::FieldType;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Transparent wrapper for [`serde_json::Error`]
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    /// Transparent wrapper for [`exile_bundle::error::Error`]
    #[error(transparent)]
    Bundle(#[from] exile_bundle::error::Error),

    /// file is too small to hold a row count and boundary marker
    #[error("DAT file too small: {0} bytes")]
    FileTooSmall(usize),

    /// row count header is negative or past the sanity limit
    #[error("row count {0} exceeds reasonable limit")]
    RowCountExceedsLimit(i32),

    /// no 0xBB marker run sits at a row-aligned position
    #[error("aligned boundary marker not found (file size {file_size}, row count {row_count})")]
    BoundaryNotFound { file_size: usize, row_count: u32 },

    /// the fixed section length disagrees with the row count
    #[error("fixed section of {fixed_len} bytes does not divide into {row_count} rows")]
    RowSizeMismatch { fixed_len: usize, row_count: u32 },

    /// high half of a 64-bit long reference is neither zero nor the sentinel
    #[error("unexpected value in high half of longid: {low:#018x} {high:#018x}")]
    LongIdCorrupt { low: u64, high: u64 },

    /// a heap offset points outside the dynamic section
    #[error("{kind} offset {offset} out of range (dynamic section is {len} bytes)")]
    OffsetOutOfRange {
        kind: &'static str,
        offset: u64,
        len: usize,
    },

    /// a heap string ran past the configured maximum length
    #[error("string at offset {offset} exceeds maximum length of {max} code units")]
    StringTooLong { offset: u64, max: usize },

    /// the schema names a type this decoder cannot read in that position
    #[error("unsupported field type {0:?}")]
    UnsupportedFieldType(FieldType),

    /// an array header claims more elements than the configured maximum
    #[error("array count {count} exceeds maximum {max}")]
    ArrayCountExceedsLimit { count: u64, max: usize },

    /// no schema is compatible with the requested table and game version
    #[error("no schema found for table {table} compatible with game version {version}")]
    SchemaNotFound { table: String, version: String },

    /// the schema document itself fails validation
    #[error("invalid schema document: {0}")]
    InvalidSchema(String),

    /// the caller cancelled the decode
    #[error("decode cancelled")]
    Cancelled,
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
