//! Source map fragments and how they are bound to output records.

use serde::{Deserialize, Serialize};

use crate::{FileRecord, SourceMapError};

/// A version 3 source map.
///
/// Only `file` and `mappings` are ever touched by this crate; every other
/// field, including unknown extension fields, is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Format version, always `3`.
    pub version: u32,
    /// Name of the generated file this map describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Prefix applied to every entry of `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    /// Original sources.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Inlined contents of the original sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    /// Symbol names referenced by the mappings.
    #[serde(default)]
    pub names: Vec<String>,
    /// Base64 VLQ encoded mappings, one `;` separated group per generated line.
    #[serde(default)]
    pub mappings: String,
    /// Extension fields.
    #[serde(flatten)]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

impl Default for SourceMap {
    fn default() -> Self {
        Self {
            version: 3,
            file: None,
            source_root: None,
            sources: Vec::new(),
            sources_content: None,
            names: Vec::new(),
            mappings: String::new(),
            extensions: serde_json::Map::new(),
        }
    }
}

impl SourceMap {
    /// Parses a JSON encoded source map.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] if the input is not a valid source map.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Encodes the source map as JSON.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] if an extension field cannot be encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Moves every generated position `lines` lines down.
    ///
    /// Used when text is prepended to the generated file. Segment columns are
    /// relative to the start of their line, and the source/name/original
    /// fields are relative to the previous segment across lines, so adding
    /// empty line groups in front is enough.
    pub fn offset_lines(&mut self, lines: usize) {
        if lines == 0 {
            return;
        }
        let mut mappings = ";".repeat(lines);
        mappings.push_str(&self.mappings);
        self.mappings = mappings;
    }
}

/// The source map a record arrives with, ready to have chunk maps chained onto it.
///
/// A chunk map points into the stylesheet held by the record. Chained through
/// the record's own map, it points back to what that stylesheet was generated
/// from instead (a `.scss` file for instance).
#[derive(Debug, Clone)]
pub struct SourceMapChain {
    upstream: ::sourcemap::SourceMap,
}

impl SourceMapChain {
    /// Decodes the record's map.
    ///
    /// Returns `None` when it has no mappings: chunk maps are then bound as they are.
    ///
    /// # Errors
    ///
    /// Returns [`SourceMapError::Invalid`] when the map cannot be decoded.
    pub fn new(upstream: &SourceMap) -> Result<Option<Self>, SourceMapError> {
        if upstream.mappings.is_empty() {
            return Ok(None);
        }
        let upstream = decode(upstream)?;
        Ok(Some(Self { upstream }))
    }

    /// Chains `fragment` onto the record's map.
    ///
    /// The result keeps the generated positions of `fragment` and the original
    /// positions, `sources` and `sourcesContent` of the record's map. Extension
    /// fields of `fragment` are not carried over.
    ///
    /// # Errors
    ///
    /// Returns [`SourceMapError::Invalid`] when `fragment` cannot be decoded,
    /// [`SourceMapError::Encoding`] when the composed map cannot be encoded.
    pub fn compose(&self, fragment: &SourceMap) -> Result<SourceMap, SourceMapError> {
        let adjustment = decode(fragment)?;
        let mut composed = self.upstream.clone();
        composed.adjust_mappings(&adjustment);

        let mut buffer = Vec::new();
        composed
            .to_writer(&mut buffer)
            .map_err(|error| SourceMapError::Encoding {
                message: error.to_string(),
            })?;
        serde_json::from_slice(&buffer).map_err(|error| SourceMapError::Encoding {
            message: error.to_string(),
        })
    }
}

fn decode(map: &SourceMap) -> Result<::sourcemap::SourceMap, SourceMapError> {
    let invalid = |message: String| SourceMapError::Invalid { message };
    let json = map.to_json().map_err(|error| invalid(error.to_string()))?;
    ::sourcemap::SourceMap::from_slice(json.as_bytes())
        .map_err(|error| invalid(error.to_string()))
}

/// Binds a source map fragment to an output record.
///
/// The fragment's `file` is rewritten to the record's relative path (with
/// forward slashes), and its mappings are shifted by `header_lines` to account
/// for text prepended to the chunk. Any map already on the record is
/// replaced: chain the fragment with [`SourceMapChain::compose`] first to keep
/// the record's sources. Must be called once the record path is final.
#[must_use]
pub fn attach_source_map(
    mut record: FileRecord,
    mut fragment: SourceMap,
    header_lines: usize,
) -> FileRecord {
    let file = record
        .relative()
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    fragment.file = Some(file);
    fragment.offset_lines(header_lines);
    record.source_map = Some(fragment);
    record
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn fragment() -> SourceMap {
        SourceMap {
            file: Some("main.css".to_string()),
            sources: vec!["main.scss".to_string()],
            mappings: "AAAA,SAAS;AACT".to_string(),
            ..SourceMap::default()
        }
    }

    #[test]
    fn should_rewrite_file_to_record_relative_path() {
        let record = FileRecord::null("/site/css/main-blessed1.css").with_base("/site");

        let record = attach_source_map(record, fragment(), 0);

        let map = record.source_map.expect("map attached");
        assert_eq!(map.file.as_deref(), Some("css/main-blessed1.css"));
        assert_eq!(map.mappings, "AAAA,SAAS;AACT");
        assert_eq!(map.sources, vec!["main.scss".to_string()]);
    }

    #[test]
    fn should_write_file_outside_base_relative_to_it() {
        let record = FileRecord::null("/site/vendor/lib-blessed1.css").with_base("/site/css");

        let record = attach_source_map(record, fragment(), 0);

        let map = record.source_map.expect("map attached");
        assert_eq!(map.file.as_deref(), Some("../vendor/lib-blessed1.css"));
    }

    #[test]
    fn should_shift_mappings_by_header_lines() {
        let record = FileRecord::null("main.css");

        let record = attach_source_map(record, fragment(), 4);

        let map = record.source_map.expect("map attached");
        assert_eq!(map.mappings, ";;;;AAAA,SAAS;AACT");
    }

    #[test]
    fn should_replace_existing_record_map() {
        let previous = SourceMap {
            mappings: "CAAC".to_string(),
            ..SourceMap::default()
        };
        let record = FileRecord::null("main.css").with_source_map(previous);

        let record = attach_source_map(record, fragment(), 0);

        let map = record.source_map.expect("map attached");
        assert_eq!(map.mappings, "AAAA,SAAS;AACT");
    }

    fn upstream() -> SourceMap {
        SourceMap {
            file: Some("main.css".to_string()),
            sources: vec!["main.scss".to_string()],
            mappings: "AAAA;AACA;AACA".to_string(),
            ..SourceMap::default()
        }
    }

    #[test]
    fn should_not_chain_onto_map_without_mappings() {
        let chain = SourceMapChain::new(&SourceMap::default()).expect("valid map");

        assert!(chain.is_none());
    }

    #[test]
    fn should_chain_chunk_map_back_to_original_sources() {
        let chain = SourceMapChain::new(&upstream())
            .expect("valid map")
            .expect("map with mappings");
        // first line of the chunk comes from the second line of main.css
        let fragment = SourceMap {
            file: Some("main-blessed1.css".to_string()),
            sources: vec!["main.css".to_string()],
            mappings: "AACA".to_string(),
            ..SourceMap::default()
        };

        let composed = chain.compose(&fragment).expect("composable maps");

        assert_eq!(composed.version, 3);
        assert_eq!(composed.sources, vec!["main.scss".to_string()]);
        assert!(composed.mappings.starts_with("AACA"));
    }

    #[test]
    fn should_reject_undecodable_map() {
        let broken = SourceMap {
            mappings: "!!!!".to_string(),
            ..SourceMap::default()
        };

        let result = SourceMapChain::new(&broken);

        assert!(matches!(result, Err(SourceMapError::Invalid { .. })));
    }

    #[test]
    fn should_keep_extension_fields_through_json() {
        let json = r#"{"version":3,"file":"a.css","sources":["a.scss"],"names":[],"mappings":"AAAA","x_google_ignoreList":[0]}"#;

        let mut map = SourceMap::from_json(json).expect("valid map");
        map.file = Some("a-blessed1.css".to_string());
        let encoded = map.to_json().expect("encodable map");

        assert_snapshot!(encoded, @r#"{"version":3,"file":"a-blessed1.css","sources":["a.scss"],"names":[],"mappings":"AAAA","x_google_ignoreList":[0]}"#);
    }
}
