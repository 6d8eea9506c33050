//! The bless stage: turns one file record into the records to emit.
//!
//! A record goes through the following steps:
//!
//! 1. **Reading**: records without contents, or with empty contents, pass
//!    through untouched. Streamed contents are rejected.
//! 2. **Splitting**: the [`ChunkEngine`] cuts the stylesheet. When it returns a
//!    single chunk the original record passes through untouched.
//! 3. **Emitting**: one record per chunk, in chunk order. Every chunk but the
//!    last gets a `-blessed<n>` path, the last one keeps the original path and
//!    receives the import header.
//!
//! Everything that can fail happens before the first output record exists,
//! so a record either produces all its outputs or none.

use std::borrow::Cow;
use std::fmt;
use std::iter::FusedIterator;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::{
    BlessError, BlessOptions, CacheBuster, ChunkEngine, ChunkResult, Contents, FileRecord,
    ImportHeader, RandomCacheBuster, SourceMap, SourceMapChain, attach_source_map, blessed_path,
    chunk_stylesheet,
};


/// Receives the records produced by a stage.
pub trait RecordSink {
    /// Takes ownership of an emitted record.
    fn push(&mut self, record: FileRecord);
}

impl RecordSink for Vec<FileRecord> {
    fn push(&mut self, record: FileRecord) {
        Vec::push(self, record);
    }
}

impl<F> RecordSink for F
where
    F: FnMut(FileRecord),
{
    fn push(&mut self, record: FileRecord) {
        self(record);
    }
}

/// A pipeline stage splitting stylesheets that have too many selectors.
///
/// # Example
///
/// ```rust
/// use blesser_core::{BlessOptions, BlessStage, ChunkResult, FileRecord, FixedCacheBuster, chunk_engine_fn};
///
/// // Stands in for a real selector-counting engine.
/// let engine = chunk_engine_fn(|css, _request| {
///     Ok(ChunkResult {
///         data: css.split_inclusive('}').map(str::to_string).collect(),
///         maps: None,
///         total_selector_count: 2,
///     })
/// });
///
/// let stage = BlessStage::with_options(engine, BlessOptions::default())
///     .with_cache_buster(FixedCacheBuster(42));
///
/// let mut emitted: Vec<FileRecord> = Vec::new();
/// stage.transform(FileRecord::new("a.css", "body{}.x{}"), &mut emitted)?;
///
/// assert_eq!(emitted.len(), 2);
/// assert_eq!(emitted[0].path.to_str(), Some("a-blessed1.css"));
/// assert_eq!(emitted[1].path.to_str(), Some("a.css"));
/// assert_eq!(
///     emitted[1].contents.as_bytes(),
///     Some(b"@import url('a-blessed1.css?z=42');\n\n.x{}".as_slice())
/// );
/// # Ok::<(), blesser_core::BlessError>(())
/// ```
pub struct BlessStage<E> {
    engine: E,
    options: BlessOptions,
    cache_buster: Box<dyn CacheBuster>,
}

impl<E> fmt::Debug for BlessStage<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlessStage")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<E> BlessStage<E>
where
    E: ChunkEngine,
{
    /// Creates a stage with the default options.
    pub fn new(engine: E) -> Self {
        Self::with_options(engine, BlessOptions::default())
    }

    /// Creates a stage with the given options.
    pub fn with_options(engine: E, options: BlessOptions) -> Self {
        debug!(?options, "bless stage configured");
        Self {
            engine,
            options,
            cache_buster: Box::new(RandomCacheBuster),
        }
    }

    /// Replaces the source of cache-busting values.
    #[must_use]
    pub fn with_cache_buster(mut self, cache_buster: impl CacheBuster + 'static) -> Self {
        self.cache_buster = Box::new(cache_buster);
        self
    }

    /// The stage options.
    #[must_use]
    pub fn options(&self) -> BlessOptions {
        self.options
    }

    /// Blesses one record.
    ///
    /// The returned [`Blessed::Split`] builds each output record lazily, when
    /// it is pulled, and cannot fail anymore.
    ///
    /// # Errors
    ///
    /// - [`BlessError::UnsupportedInputKind`] for streamed contents,
    /// - [`BlessError::SplitFailure`] when the engine fails or breaks its contract,
    /// - [`BlessError::SourceMapFailure`] when a chunk map cannot be chained onto
    ///   the record's map.
    pub fn process(&self, record: FileRecord) -> Result<Blessed, BlessError> {
        let Some(mut result) = self.split(&record)? else {
            return Ok(Blessed::Unchanged(record));
        };

        self.report(&record.path, &result);

        if !result.is_split() {
            debug!(path = %record.path.display(), "single chunk, passing through");
            return Ok(Blessed::Unchanged(record));
        }

        let maps = match (result.maps.take(), record.source_map.as_ref()) {
            (Some(fragments), Some(upstream)) => Some(chain_maps(&record.path, upstream, fragments)?),
            (maps, _) => maps,
        };

        let last_index = result.chunk_count() - 1;
        let header = self.options.imports.then(|| {
            let cache_buster = self
                .options
                .cache_buster
                .then(|| self.cache_buster.next_value());
            ImportHeader::new(&record.path, last_index, cache_buster)
        });

        debug!(
            path = %record.path.display(),
            chunks = result.chunk_count(),
            "emitting blessed files"
        );
        let mut template = record;
        template.contents = Contents::Null;
        Ok(Blessed::Split(SplitFiles {
            template,
            chunks: result.data.into_iter(),
            maps: maps.map(Vec::into_iter),
            next_index: 0,
            last_index,
            header,
        }))
    }

    /// Blesses one record and pushes every resulting record into `sink`.
    ///
    /// Records are pushed one by one as they are built. On error nothing is
    /// pushed.
    ///
    /// # Errors
    ///
    /// Same as [`BlessStage::process`].
    pub fn transform<S>(&self, record: FileRecord, sink: &mut S) -> Result<(), BlessError>
    where
        S: RecordSink + ?Sized,
    {
        for output in self.process(record)? {
            sink.push(output);
        }
        Ok(())
    }

    /// Reads the record and runs the engine.
    ///
    /// Returns `None` when there is nothing to split.
    fn split(&self, record: &FileRecord) -> Result<Option<ChunkResult>, BlessError> {
        let bytes = match &record.contents {
            Contents::Null => {
                debug!(path = %record.path.display(), "no contents, passing through");
                return Ok(None);
            }
            Contents::Stream => {
                return Err(BlessError::UnsupportedInputKind {
                    path: record.path.clone(),
                });
            }
            Contents::Buffer(bytes) if bytes.is_empty() => {
                debug!(path = %record.path.display(), "empty contents, passing through");
                return Ok(None);
            }
            Contents::Buffer(bytes) => bytes,
        };

        let css = String::from_utf8_lossy(bytes);
        if matches!(css, Cow::Owned(_)) {
            warn!(path = %record.path.display(), "invalid UTF-8 replaced before splitting");
        }

        let want_maps = record.source_map.is_some();
        chunk_stylesheet(&self.engine, &css, &record.path, want_maps)
            .map(Some)
            .map_err(|source| BlessError::SplitFailure {
                path: record.path.clone(),
                source,
            })
    }

    fn report(&self, path: &Path, result: &ChunkResult) {
        if self.options.log {
            info!(path = %path.display(), "{}", summary(result));
        }
    }
}

/// The per-file line reported when logging is enabled.
fn summary(result: &ChunkResult) -> String {
    let selectors = result.total_selector_count;
    if result.is_split() {
        format!(
            "Found {selectors} selectors, splitting into {} blessedFiles.",
            result.chunk_count()
        )
    } else {
        format!("Found {selectors} selector, not splitting.")
    }
}

/// Chains every chunk map onto the map the record arrived with.
fn chain_maps(
    path: &Path,
    upstream: &SourceMap,
    fragments: Vec<SourceMap>,
) -> Result<Vec<SourceMap>, BlessError> {
    let failure = |source| BlessError::SourceMapFailure {
        path: path.to_path_buf(),
        source,
    };
    let Some(chain) = SourceMapChain::new(upstream).map_err(failure)? else {
        return Ok(fragments);
    };

    debug!(path = %path.display(), "chaining chunk maps onto the record map");
    fragments
        .iter()
        .map(|fragment| chain.compose(fragment).map_err(failure))
        .collect()
}

/// What a stage produced for one record.
#[derive(Debug)]
pub enum Blessed {
    /// No split was needed: the original record, untouched.
    Unchanged(FileRecord),
    /// The records of the split, in chunk order.
    Split(SplitFiles),
}

impl Blessed {
    /// Returns `true` when the record was split.
    #[must_use]
    pub fn is_split(&self) -> bool {
        matches!(self, Self::Split(_))
    }

    /// Number of records this outcome emits.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Unchanged(_) => 1,
            Self::Split(files) => files.len(),
        }
    }

    /// Always `false`: an outcome emits at least one record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds every record.
    #[must_use]
    pub fn into_records(self) -> Vec<FileRecord> {
        self.into_iter().collect()
    }
}

impl IntoIterator for Blessed {
    type Item = FileRecord;
    type IntoIter = BlessedIter;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Self::Unchanged(record) => BlessedIter::Unchanged(Some(record)),
            Self::Split(files) => BlessedIter::Split(files),
        }
    }
}

/// Iterator over the records of a [`Blessed`] outcome.
#[derive(Debug)]
pub enum BlessedIter {
    /// Yields the original record once.
    Unchanged(Option<FileRecord>),
    /// Yields the split records.
    Split(SplitFiles),
}

impl Iterator for BlessedIter {
    type Item = FileRecord;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Unchanged(record) => record.take(),
            Self::Split(files) => files.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Unchanged(record) => {
                let len = usize::from(record.is_some());
                (len, Some(len))
            }
            Self::Split(files) => files.size_hint(),
        }
    }
}

impl ExactSizeIterator for BlessedIter {}

impl FusedIterator for BlessedIter {}

/// The records of a split, built one at a time.
///
/// Yields exactly one record per chunk, in chunk order.
#[derive(Debug)]
pub struct SplitFiles {
    template: FileRecord,
    chunks: std::vec::IntoIter<String>,
    maps: Option<std::vec::IntoIter<SourceMap>>,
    next_index: usize,
    last_index: usize,
    header: Option<ImportHeader>,
}

impl SplitFiles {
    /// The import header the primary record receives, if any.
    #[must_use]
    pub fn header(&self) -> Option<&ImportHeader> {
        self.header.as_ref()
    }
}

impl Iterator for SplitFiles {
    type Item = FileRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        let fragment = self.maps.as_mut().and_then(Iterator::next);
        let index = self.next_index;
        self.next_index += 1;

        let mut record = self.template.clone_without_contents();
        let is_primary = index == self.last_index;
        if !is_primary {
            record.path = blessed_path(&self.template.path, index);
        }

        let (contents, header_lines) = match self.header.as_ref().filter(|_| is_primary) {
            Some(header) => (header.apply(&chunk), header.line_count()),
            None => (chunk, 0),
        };
        record.contents = Contents::from(contents);

        if let Some(fragment) = fragment {
            record = attach_source_map(record, fragment, header_lines);
        }

        debug!(index, path = %record.path.display(), "blessed file ready");
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for SplitFiles {}

impl FusedIterator for SplitFiles {}
