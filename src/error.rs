//! Error types shared across the crate.

use std::io;
use thiserror::Error;

/// Errors reported by a [`FeatureIndex`](crate::index::FeatureIndex).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("sequence '{0}' is not present in the index")]
    NotFound(String),

    #[error("query {seqid}[{start}, {end}) failed: {message}")]
    QueryError {
        seqid: String,
        start: u64,
        end: u64,
        message: String,
    },
}

/// Errors that can occur while reading GFF3 input.
#[derive(Error, Debug)]
pub enum Gff3Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid GFF3 content: {0}")]
    InvalidFormat(String),
}

/// A failure that aborted the processing of one whole sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("sequence '{seqid}' could not be processed: {source}")]
pub struct SequenceError {
    pub seqid: String,
    #[source]
    pub source: IndexError,
}

/// Top-level error for commands driven from the CLI.
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Gff3(#[from] Gff3Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_error_message() {
        let err = SequenceError {
            seqid: "chr7".to_string(),
            source: IndexError::NotFound("chr7".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "sequence 'chr7' could not be processed: sequence 'chr7' is not present in the index"
        );
    }

    #[test]
    fn test_gff3_error_wraps_into_compare_error() {
        let err: CompareError = Gff3Error::Parse {
            line: 3,
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Parse error at line 3: bad");
    }
}
