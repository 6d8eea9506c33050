//! Stage configuration.

use serde::Deserialize;

/// Options of a [`BlessStage`](crate::BlessStage).
///
/// Fixed for the lifetime of the stage. Missing keys take their default when
/// deserialized, so a host can load them straight from its own config file:
///
/// ```rust
/// use blesser_core::BlessOptions;
///
/// let options: BlessOptions = serde_json::from_str(r#"{ "cacheBuster": false }"#)?;
///
/// assert!(options.imports);
/// assert!(!options.cache_buster);
/// assert!(!options.log);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlessOptions {
    /// Prepend `@import` directives for the sibling chunks to the primary chunk.
    ///
    /// Default: `true`.
    pub imports: bool,

    /// Append a random `?z=` query to every import reference.
    ///
    /// Default: `true`.
    pub cache_buster: bool,

    /// Report the selector count and the split decision for every file at `info` level.
    ///
    /// Default: `false`.
    pub log: bool,
}

impl Default for BlessOptions {
    fn default() -> Self {
        Self {
            imports: true,
            cache_buster: true,
            log: false,
        }
    }
}

impl BlessOptions {
    /// Enables or disables the import header.
    #[must_use]
    pub fn with_imports(mut self, imports: bool) -> Self {
        self.imports = imports;
        self
    }

    /// Enables or disables the cache-busting query.
    #[must_use]
    pub fn with_cache_buster(mut self, cache_buster: bool) -> Self {
        self.cache_buster = cache_buster;
        self
    }

    /// Enables or disables the per-file summary.
    #[must_use]
    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn should_default_to_imports_with_cache_buster() {
        let options = BlessOptions::default();

        assert!(options.imports);
        assert!(options.cache_buster);
        assert!(!options.log);
    }

    #[rstest]
    #[case("{}", BlessOptions::default())]
    #[case(r#"{"imports": false}"#, BlessOptions::default().with_imports(false))]
    #[case(r#"{"cacheBuster": false}"#, BlessOptions::default().with_cache_buster(false))]
    #[case(
        r#"{"imports": false, "cacheBuster": false, "log": true}"#,
        BlessOptions { imports: false, cache_buster: false, log: true }
    )]
    fn should_deserialize_with_defaults(#[case] json: &str, #[case] expected: BlessOptions) {
        let options: BlessOptions = serde_json::from_str(json).expect("valid options");

        assert_eq!(options, expected);
    }

    #[test]
    fn should_chain_builder_methods() {
        let options = BlessOptions::default()
            .with_imports(false)
            .with_cache_buster(false)
            .with_log(true);

        assert_eq!(
            options,
            BlessOptions {
                imports: false,
                cache_buster: false,
                log: true,
            }
        );
    }
}
