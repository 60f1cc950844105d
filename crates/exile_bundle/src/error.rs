//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRwError(#[from] binrw::Error),

    /// bundle header is shorter than the fixed 60 bytes
    #[error("bundle header too short")]
    HeaderTooShort,

    /// block size table ends before all entries could be read
    #[error("bundle block table too short (expected {expected} entries)")]
    BlockTableTooShort { expected: u32 },

    /// header block granularity is zero
    #[error("bundle block granularity is zero")]
    InvalidGranularity,

    /// declared block count disagrees with the computed one
    #[error(
        "bundle declares {declared} blocks but {computed} are needed for {size} bytes at granularity {granularity}"
    )]
    BlockCountMismatch {
        declared: u32,
        computed: u32,
        size: i64,
        granularity: i64,
    },

    /// a read was requested past the end of the uncompressed stream
    #[error("read outside bounds of bundle (offset {offset}, len {len}, size {size})")]
    OutOfBounds { offset: i64, len: usize, size: i64 },

    /// the block codec failed or produced the wrong number of bytes
    #[error("decompression failed: {0}")]
    CodecError(String),

    /// index data ends before a section could be read
    #[error("index data truncated at offset {offset}")]
    IndexTruncated { offset: usize },

    /// two index entries share one path hash
    #[error("duplicate path hash {hash:#018x} in index")]
    DuplicateHash { hash: u64 },

    /// the embedded path-rep bundle could not be decoded
    #[error("embedded pathrep bundle: {0}")]
    EmbeddedBundleError(#[source] Box<Error>),

    /// unable to find the requested file under any candidate path
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// patch version does not belong to a supported game generation
    #[error("unsupported game version: {0}")]
    UnsupportedGameVersion(String),

    /// language name is not one the game ships
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// a sprite index line did not match the expected format
    #[error("sprite index line {line} has an invalid format")]
    InvalidSpriteIndex { line: usize },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
