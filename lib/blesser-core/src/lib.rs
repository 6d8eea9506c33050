//! # Blesser Core
//!
//! Split stylesheets that hold too many selectors into several files, each of
//! them within the limit older browsers enforce on a single stylesheet.
//!
//! The crate is a pipeline stage: it takes one [`FileRecord`] and emits one or
//! more records. Counting selectors and choosing the cut points is delegated to
//! a [`ChunkEngine`]; the stage names the resulting files, links them together
//! with `@import` directives and carries source maps across.
//!
//! ## Quick Start
//!
//! ```rust
//! use blesser_core::{BlessStage, Blessed, ChunkResult, FileRecord, FixedCacheBuster, chunk_engine_fn};
//!
//! // One chunk per rule, standing in for a real selector-counting engine.
//! let engine = chunk_engine_fn(|css, _request| {
//!     let data: Vec<String> = css.split_inclusive('}').map(str::to_string).collect();
//!     let total_selector_count = data.len();
//!     Ok(ChunkResult { data, maps: None, total_selector_count })
//! });
//! let stage = BlessStage::new(engine).with_cache_buster(FixedCacheBuster(7));
//!
//! let blessed = stage.process(FileRecord::new("styles/app.css", "a{}b{}c{}"))?;
//! assert!(blessed.is_split());
//!
//! let paths: Vec<_> = blessed
//!     .into_iter()
//!     .map(|record| record.path.display().to_string())
//!     .collect();
//! assert_eq!(
//!     paths,
//!     ["styles/app-blessed1.css", "styles/app-blessed2.css", "styles/app.css"]
//! );
//! # Ok::<(), blesser_core::BlessError>(())
//! ```
//!
//! ## Output layout
//!
//! For an input `app.css` cut into `N` chunks:
//!
//! - chunks `1..N-1` become `app-blessed1.css` .. `app-blessed<N-1>.css`, next to the input,
//! - the last chunk keeps the `app.css` path and, unless disabled in
//!   [`BlessOptions`], starts with one `@import url('app-blessed<i>.css?z=<n>');`
//!   line per sibling chunk.
//!
//! Records that do not need a split pass through untouched.
//!
//! ## Async pipelines
//!
//! [`run_stage`] and [`spawn_stage`] drive a stage between two Tokio channels.

mod cache_buster;
mod channel;
mod engine;
mod error;
mod imports;
mod naming;
mod options;
mod record;
mod sourcemap;
mod stage;

pub use self::cache_buster::{CACHE_BUSTER_MAX, CacheBuster, FixedCacheBuster, RandomCacheBuster};
pub use self::channel::{
    CHANNEL_BUFFER_SIZE, StageChannels, StageItem, StageReport, run_stage, spawn_stage,
};
pub use self::engine::{ChunkEngine, ChunkRequest, ChunkResult, chunk_engine_fn, chunk_stylesheet};
pub use self::error::{BlessError, EngineError, STAGE_NAME, SourceMapError};
pub use self::imports::{ImportHeader, prefix_imports};
pub use self::naming::{BLESSED_SUFFIX, blessed_file_name, blessed_path};
pub use self::options::BlessOptions;
pub use self::record::{Contents, FileRecord};
pub use self::sourcemap::{SourceMap, SourceMapChain, attach_source_map};
pub use self::stage::{BlessStage, Blessed, BlessedIter, RecordSink, SplitFiles};
