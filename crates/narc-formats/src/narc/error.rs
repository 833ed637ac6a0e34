//! Archive container error types

use thiserror::Error;

use crate::cursor::OutOfRange;
use crate::fnt::FntError;

/// Result type for archive container operations
pub type NarcResult<T> = Result<T, NarcError>;

/// Archive container error type
#[derive(Debug, Error)]
pub enum NarcError {
    /// A block's magic tag did not match the expected literal
    #[error("invalid {block} block magic: {found:02x?}")]
    BadMagic {
        /// Which block carried the bad magic
        block: &'static str,
        /// The four bytes found in its place
        found: [u8; 4],
    },

    /// The filename table block could not be decoded or encoded
    #[error("filename table: {0}")]
    Fnt(#[from] FntError),

    /// The archive ended before a header, table or payload could be read
    #[error("archive truncated: {0}")]
    Truncated(#[from] OutOfRange),
}
