//! The file record flowing through the pipeline.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use indexmap::IndexMap;

use crate::SourceMap;

/// Contents carried by a [`FileRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Contents {
    /// No contents at all (directories, placeholder records).
    #[default]
    Null,
    /// Fully materialized contents.
    Buffer(Bytes),
    /// Marker for contents the host delivers as a stream.
    Stream,
}

impl Contents {
    /// Returns `true` for [`Contents::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for [`Contents::Stream`].
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream)
    }

    /// Returns the buffered bytes, if any.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Buffer(bytes) => Some(bytes),
            Self::Null | Self::Stream => None,
        }
    }
}

impl From<String> for Contents {
    fn from(value: String) -> Self {
        Self::Buffer(Bytes::from(value))
    }
}

impl From<&'static str> for Contents {
    fn from(value: &'static str) -> Self {
        Self::Buffer(Bytes::from_static(value.as_bytes()))
    }
}

impl From<Vec<u8>> for Contents {
    fn from(value: Vec<u8>) -> Self {
        Self::Buffer(Bytes::from(value))
    }
}

impl From<Bytes> for Contents {
    fn from(value: Bytes) -> Self {
        Self::Buffer(value)
    }
}

/// One file flowing through the pipeline.
///
/// The stage never mutates a record it receives: output records are derived
/// with [`FileRecord::clone_without_contents`].
///
/// # Example
///
/// ```rust
/// use blesser_core::FileRecord;
///
/// let record = FileRecord::new("/project/css/main.css", "body { color: red }")
///     .with_base("/project/css");
///
/// assert_eq!(record.relative(), std::path::Path::new("main.css"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecord {
    /// Location of the file.
    pub path: PathBuf,
    /// Directory the relative path is computed from.
    pub base: Option<PathBuf>,
    /// The file contents.
    pub contents: Contents,
    /// Source map describing `contents`.
    pub source_map: Option<SourceMap>,
    /// Host-defined metadata, copied along with the record.
    pub attributes: IndexMap<String, serde_json::Value>,
}

impl FileRecord {
    /// Creates a record with the given path and contents.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Contents>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            ..Self::default()
        }
    }

    /// Creates a record without contents.
    pub fn null(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Contents::Null)
    }

    /// Creates a record whose contents are delivered as a stream.
    pub fn stream(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Contents::Stream)
    }

    /// Sets the base directory.
    #[must_use]
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Sets the source map.
    #[must_use]
    pub fn with_source_map(mut self, source_map: SourceMap) -> Self {
        self.source_map = Some(source_map);
        self
    }

    /// Adds a host attribute.
    #[must_use]
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Copies every piece of metadata but leaves the contents empty.
    #[must_use]
    pub fn clone_without_contents(&self) -> Self {
        Self {
            path: self.path.clone(),
            base: self.base.clone(),
            contents: Contents::Null,
            source_map: self.source_map.clone(),
            attributes: self.attributes.clone(),
        }
    }

    /// The path relative to [`base`](Self::base).
    ///
    /// A path outside the base climbs out of it with `..` components. Falls
    /// back to the full path when there is no base, or when no relative path
    /// exists (one of them absolute and not the other, or a base with `..`).
    #[must_use]
    pub fn relative(&self) -> PathBuf {
        self.base
            .as_deref()
            .and_then(|base| relative_to(&self.path, base))
            .unwrap_or_else(|| self.path.clone())
    }
}

fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.is_absolute() != base.is_absolute() {
        return None;
    }

    let mut path_parts = path.components();
    let mut base_parts = base.components();
    let mut parts: Vec<Component<'_>> = Vec::new();
    loop {
        match (path_parts.next(), base_parts.next()) {
            (None, None) => break,
            (Some(part), None) => {
                parts.push(part);
                parts.extend(path_parts.by_ref());
                break;
            }
            (None, Some(_)) => parts.push(Component::ParentDir),
            (Some(part), Some(base_part)) if parts.is_empty() && part == base_part => {}
            (Some(part), Some(Component::CurDir)) => parts.push(part),
            (Some(_), Some(Component::ParentDir)) => return None,
            (Some(part), Some(_)) => {
                parts.push(Component::ParentDir);
                parts.extend(base_parts.by_ref().map(|_| Component::ParentDir));
                parts.push(part);
                parts.extend(path_parts.by_ref());
                break;
            }
        }
    }

    Some(parts.into_iter().map(Component::as_os_str).collect())
}
