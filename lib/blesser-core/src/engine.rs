//! The boundary with the selector-counting engine.
//!
//! Deciding where a stylesheet must be cut is not done here: a [`ChunkEngine`]
//! counts selectors and returns the chunks. This module only calls it and
//! checks that what comes back can be turned into files.

use std::path::Path;

use tracing::debug;

use crate::{EngineError, SourceMap};

/// What the engine is asked to do for one stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRequest<'a> {
    /// Path of the stylesheet, used by the engine for source map `sources`.
    pub source: &'a Path,
    /// Whether one source map fragment per chunk is expected.
    pub source_maps: bool,
}

/// What the engine returns for one stylesheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChunkResult {
    /// Chunk texts, in stylesheet order.
    pub data: Vec<String>,
    /// One source map fragment per chunk, when they were requested.
    pub maps: Option<Vec<SourceMap>>,
    /// Number of selectors found in the whole stylesheet.
    pub total_selector_count: usize,
}

impl ChunkResult {
    /// A result with a single chunk: no split needed.
    pub fn unsplit(css: impl Into<String>, total_selector_count: usize) -> Self {
        Self {
            data: vec![css.into()],
            maps: None,
            total_selector_count,
        }
    }

    /// Number of chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the engine cut the stylesheet.
    #[must_use]
    pub fn is_split(&self) -> bool {
        self.data.len() > 1
    }
}

/// Splits a stylesheet into chunks that each respect the selector limit.
///
/// Any `Fn(&str, &ChunkRequest) -> Result<ChunkResult, EngineError>` is an engine.
///
/// # Example
///
/// ```rust
/// use blesser_core::{ChunkEngine, ChunkRequest, ChunkResult, EngineError};
///
/// struct Unsplit;
///
/// impl ChunkEngine for Unsplit {
///     fn chunk(&self, css: &str, _request: &ChunkRequest<'_>) -> Result<ChunkResult, EngineError> {
///         Ok(ChunkResult::unsplit(css, 0))
///     }
/// }
/// ```
pub trait ChunkEngine {
    /// Splits `css`.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the stylesheet cannot be processed.
    fn chunk(&self, css: &str, request: &ChunkRequest<'_>) -> Result<ChunkResult, EngineError>;
}

impl<F> ChunkEngine for F
where
    F: Fn(&str, &ChunkRequest<'_>) -> Result<ChunkResult, EngineError>,
{
    fn chunk(&self, css: &str, request: &ChunkRequest<'_>) -> Result<ChunkResult, EngineError> {
        self(css, request)
    }
}

/// Turns a closure into a [`ChunkEngine`], pinning its signature.
///
/// ```rust
/// use blesser_core::{ChunkResult, chunk_engine_fn};
///
/// let engine = chunk_engine_fn(|css, _request| Ok(ChunkResult::unsplit(css, 0)));
/// ```
pub fn chunk_engine_fn<F>(engine: F) -> F
where
    F: Fn(&str, &ChunkRequest<'_>) -> Result<ChunkResult, EngineError>,
{
    engine
}

/// Runs the engine on `css` and checks its contract.
///
/// # Errors
///
/// Returns the engine's own error, [`EngineError::NoChunks`] when nothing came
/// back, or [`EngineError::MapFragmentMismatch`] when `want_maps` is set, the
/// stylesheet was split and the fragments do not line up with the chunks.
pub fn chunk_stylesheet<E>(
    engine: &E,
    css: &str,
    source: &Path,
    want_maps: bool,
) -> Result<ChunkResult, EngineError>
where
    E: ChunkEngine + ?Sized,
{
    let request = ChunkRequest {
        source,
        source_maps: want_maps,
    };
    let mut result = engine.chunk(css, &request)?;
    debug!(
        source = %source.display(),
        chunks = result.data.len(),
        selectors = result.total_selector_count,
        "stylesheet chunked"
    );

    if result.data.is_empty() {
        return Err(EngineError::NoChunks);
    }

    if want_maps && result.is_split() {
        let chunks = result.data.len();
        let maps = result.maps.as_ref().map_or(0, Vec::len);
        if maps != chunks {
            return Err(EngineError::MapFragmentMismatch { chunks, maps });
        }
    } else {
        // a single chunk passes through with the record's own map
        result.maps = None;
    }

    Ok(result)
}
