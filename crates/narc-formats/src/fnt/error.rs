//! Filename table error types

use thiserror::Error;

use crate::cursor::OutOfRange;

/// Result type for filename table operations
pub type FntResult<T> = Result<T, FntError>;

/// Filename table error type
#[derive(Debug, Error)]
pub enum FntError {
    /// A file or folder name exceeds the 127-byte entry limit
    #[error("name exceeds 127 bytes: {0:?}")]
    NameTooLong(String),

    /// A folder slot was reached twice while walking the table
    #[error("folder {0:#06x} references itself or an ancestor")]
    FolderLoop(u16),

    /// The table ended before a slot or entry could be read
    #[error("name table truncated: {0}")]
    Truncated(#[from] OutOfRange),
}
