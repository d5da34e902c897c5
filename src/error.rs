use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the reader, the normalizer and the sort.
///
/// Public operations return [anyhow::Error] with path and phase context attached. The original
/// [TabularError] can be recovered with `error.downcast_ref::<TabularError>()`. Plain I/O failures
/// are carried as [std::io::Error] the same way.
///
/// A row that is shorter than the sort column is not an error. Its sort key is the empty string.
#[derive(Debug, Error)]
pub enum TabularError {
    /// The input file does not exist
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// A quoted field was still open when the stream ended
    #[error("unterminated quoted field in record {record}")]
    MalformedQuoting { record: usize },

    /// The input holds a byte sequence that is not valid in the declared encoding
    #[error("malformed {encoding} byte sequence near byte offset {offset}")]
    Encoding { encoding: &'static str, offset: u64 },

    /// Output text cannot be represented in the declared encoding
    #[error("text is not representable in {encoding}")]
    Unmappable { encoding: &'static str },

    /// The encoding label is not known
    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),

    /// The encoding is known but not ASCII compatible, which line splitting relies on
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(&'static str),

    /// A builder was given values that cannot describe a job
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The native sort utility exited unsuccessfully
    #[error("native sort failed: {0}")]
    NativeSortFailed(String),
}
