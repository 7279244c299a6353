//! Error type shared by the summarisation core.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned across port boundaries.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for codesummariser operations.
#[derive(Debug, Error)]
pub enum SummariserError {
    /// Underlying I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// YAML config parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Settings that cannot be used together.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Extension with no language mapping.
    #[error("unknown extension {0:?}")]
    UnknownExtension(String),

    /// BPE tokenizer could not be loaded.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Reading a file through the filesystem port failed.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File involved.
        path: PathBuf,
        /// Port error.
        #[source]
        source: PortError,
    },

    /// Writing a file through the filesystem port failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File involved.
        path: PathBuf,
        /// Port error.
        #[source]
        source: PortError,
    },

    /// The summary CSV is missing or malformed.
    #[error("summary store {}: {message}", path.display())]
    Store {
        /// Store location.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The language model call failed.
    #[error("LLM request failed: {0}")]
    Llm(PortError),

    /// Chunk summaries could not be reduced to fit the context.
    #[error("{0}")]
    Reduce(String),

    /// The user declined the cost estimate.
    #[error("Code summarisation cancelled by user.")]
    Cancelled,
}

/// Convenience alias for results carrying a [`SummariserError`].
pub type Result<T> = std::result::Result<T, SummariserError>;
