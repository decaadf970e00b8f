//! Error types for seq-qc-tools

use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, QcError>;

/// Errors raised while reading sequence data.
///
/// Empty input is deliberately absent: every analysis has a well-formed
/// zero result instead.
#[derive(Debug, Error)]
pub enum QcError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed FASTQ record
    #[error("Invalid FASTQ format at line {line}: {msg}")]
    Format {
        /// Line number where error occurred
        line: usize,
        /// Error message
        msg: String,
    },

    /// Compression format the reader cannot decode
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),
}

impl QcError {
    pub(crate) fn format(line: usize, msg: impl Into<String>) -> Self {
        QcError::Format {
            line,
            msg: msg.into(),
        }
    }
}
