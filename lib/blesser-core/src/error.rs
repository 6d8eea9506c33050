//! Error types for the bless stage.
//!
//! Every error is scoped to a single file record: the stage reports it and
//! the host pipeline is free to carry on with the next record.

use std::path::PathBuf;

/// Name used to tag errors and log lines coming from this stage.
pub const STAGE_NAME: &str = "blesser";

/// Errors reported by a [`ChunkEngine`](crate::ChunkEngine), or detected while
/// checking what the engine returned.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum EngineError {
    /// The engine could not split the stylesheet (malformed input, internal fault).
    #[display("{message}")]
    Failed {
        /// Description of the underlying cause.
        message: String,
    },

    /// The engine returned an empty chunk list.
    #[display("engine returned no chunks")]
    NoChunks,

    /// Source maps were requested but the engine did not return one fragment per chunk.
    #[display("engine returned {chunks} chunk(s) but {maps} source map fragment(s)")]
    MapFragmentMismatch {
        /// Number of chunks returned.
        chunks: usize,
        /// Number of source map fragments returned.
        maps: usize,
    },
}

impl EngineError {
    /// Wraps any displayable cause into an [`EngineError::Failed`].
    ///
    /// Engine implementations use this to surface their own error types.
    pub fn failed(cause: impl std::fmt::Display) -> Self {
        Self::Failed {
            message: cause.to_string(),
        }
    }
}

/// Errors raised while chaining a chunk's source map onto the record's own map.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum SourceMapError {
    /// A map could not be decoded.
    #[display("invalid source map: {message}")]
    Invalid {
        /// Decoder message.
        message: String,
    },

    /// The composed map could not be encoded back.
    #[display("cannot encode composed source map: {message}")]
    Encoding {
        /// Encoder message.
        message: String,
    },
}

/// Errors that can occur while blessing a single file record.
///
/// Every variant is fatal for the record that caused it: nothing is
/// emitted for that record, and processing the same record again would fail
/// the same way.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum BlessError {
    /// The record contents are a stream, the engine needs the whole text in memory.
    #[display("{}: streaming not supported ({})", STAGE_NAME, path.display())]
    UnsupportedInputKind {
        /// Path of the rejected record.
        path: PathBuf,
    },

    /// The splitting engine failed, or broke its contract.
    #[display("{}: failed to split {}: {}", STAGE_NAME, path.display(), source)]
    SplitFailure {
        /// Path of the record being split.
        path: PathBuf,
        /// The underlying engine error.
        source: EngineError,
    },

    /// The record's source map could not be chained with a chunk map.
    #[display("{}: failed to compose source maps of {}: {}", STAGE_NAME, path.display(), source)]
    SourceMapFailure {
        /// Path of the record being split.
        path: PathBuf,
        /// The underlying source map error.
        source: SourceMapError,
    },
}

impl BlessError {
    /// Name of the stage that produced this error.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        STAGE_NAME
    }

    /// Path of the record that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::UnsupportedInputKind { path }
            | Self::SplitFailure { path, .. }
            | Self::SourceMapFailure { path, .. } => path,
        }
    }
}
