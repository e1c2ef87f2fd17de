//! Shared error taxonomy for the sorter, re-exported by every other crate.

use thiserror::Error;

/// Errors that can escape a component of the sorter as a fatal condition.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value could not be parsed or was out of range.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A host resource (memory mapping, file descriptor, temp file) could
    /// not be acquired.
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),

    /// A record exceeded the configured maximum length.
    #[error("record too long: {len} bytes exceeds max_element of {max} bytes")]
    RecordTooLong {
        /// Length of the offending record, in bytes.
        len: u64,
        /// Configured maximum record length, in bytes.
        max: u64,
    },

    /// The streaming compressor or decompressor reported an internal failure.
    #[error("codec error: {0}")]
    Codec(String),

    /// Underlying I/O failure that is not classified as transient.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if retrying the same operation from scratch might
    /// succeed (currently only resource exhaustion qualifies).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ResourceExhaustion(_))
    }

    /// Returns `true` if the error should terminate the whole sort, as
    /// opposed to just the stream or run it was raised against.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::ResourceExhaustion(_))
    }
}

/// Result alias used throughout the sorter crates.
pub type Result<T> = std::result::Result<T, Error>;
