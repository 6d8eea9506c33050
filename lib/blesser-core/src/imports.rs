//! The `@import` header stitching the chunks of a blessed file together.

use std::path::Path;

use crate::blessed_file_name;

/// Lines taken by one import directive (the directive and a blank line).
const LINES_PER_IMPORT: usize = 2;

/// Import directives referencing the chunks that precede the primary file.
///
/// # Example
///
/// ```rust
/// use blesser_core::ImportHeader;
///
/// let header = ImportHeader::new("css/a.css", 2, Some(7));
///
/// assert_eq!(
///     header.as_str(),
///     "@import url('a-blessed1.css?z=7');\n\n@import url('a-blessed2.css?z=7');\n\n"
/// );
/// assert_eq!(header.line_count(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportHeader {
    text: String,
    imports: usize,
}

impl ImportHeader {
    /// Builds the header for the first `imports` chunks of `base_path`.
    ///
    /// Every directive shares the same `cache_buster` query value.
    pub fn new(base_path: impl AsRef<Path>, imports: usize, cache_buster: Option<u16>) -> Self {
        let base_path = base_path.as_ref();
        let query = cache_buster.map(|value| format!("?z={value}")).unwrap_or_default();

        let text = (0..imports)
            .map(|index| {
                let name = blessed_file_name(base_path, index);
                format!("@import url('{}{query}');\n\n", name.to_string_lossy())
            })
            .collect();

        Self { text, imports }
    }

    /// The header text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of import directives.
    #[must_use]
    pub fn import_count(&self) -> usize {
        self.imports
    }

    /// Number of generated lines the header adds in front of the chunk.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.imports * LINES_PER_IMPORT
    }

    /// Returns `true` when the header has no directive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imports == 0
    }

    /// Prepends the header to `contents`.
    #[must_use]
    pub fn apply(&self, contents: &str) -> String {
        let mut result = String::with_capacity(self.text.len() + contents.len());
        result.push_str(&self.text);
        result.push_str(contents);
        result
    }
}

/// Returns the contents of the chunk at `chunk_index`, with the import header
/// when it is the primary chunk.
///
/// Only the last chunk (`chunk_index == last_index`) receives the header, and
/// only when `enabled`: it keeps the original path, so it is the one external
/// references still point at.
pub fn prefix_imports(
    base_path: impl AsRef<Path>,
    chunk_index: usize,
    last_index: usize,
    contents: &str,
    enabled: bool,
    cache_buster: Option<u16>,
) -> String {
    if !enabled || chunk_index != last_index {
        return contents.to_string();
    }
    ImportHeader::new(base_path, last_index, cache_buster).apply(contents)
}
