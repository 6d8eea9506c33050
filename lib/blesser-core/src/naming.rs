//! File names of the generated chunks.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix inserted between the stem and the chunk number.
pub const BLESSED_SUFFIX: &str = "-blessed";

/// Returns the file name of the chunk at `chunk_index` (0-based).
///
/// The chunk number is 1-based: `main.css` gives `main-blessed1.css` for the
/// first chunk, `main-blessed2.css` for the second, and so on.
///
/// ```rust
/// use blesser_core::blessed_file_name;
///
/// assert_eq!(blessed_file_name("css/app.min.css", 0), "app.min-blessed1.css");
/// ```
pub fn blessed_file_name(base_path: impl AsRef<Path>, chunk_index: usize) -> OsString {
    let base_path = base_path.as_ref();
    let mut name = base_path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(BLESSED_SUFFIX);
    name.push((chunk_index + 1).to_string());
    if let Some(extension) = base_path.extension() {
        name.push(".");
        name.push(extension);
    }
    name
}

/// Returns the path of the chunk at `chunk_index`, next to `base_path`.
///
/// The last chunk of a split never goes through here: it keeps `base_path`
/// itself so existing references to the file keep working.
pub fn blessed_path(base_path: impl AsRef<Path>, chunk_index: usize) -> PathBuf {
    let base_path = base_path.as_ref();
    let name = blessed_file_name(base_path, chunk_index);
    match base_path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
