#![allow(dead_code, missing_docs, clippy::expect_used)]

use rstest::fixture;
use tracing::info;

use blesser_core::{ChunkEngine, ChunkRequest, ChunkResult, EngineError, SourceMap};

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

/// Naive selector counter: rules end with `}`, selectors before `{` are comma separated.
///
/// Chunks are filled rule by rule until the next rule would exceed the budget.
#[derive(Debug, Clone, Copy)]
pub struct SelectorBudget {
    pub max_selectors: usize,
}

impl SelectorBudget {
    fn selectors(rule: &str) -> usize {
        rule.split_once('{')
            .map_or(0, |(selectors, _)| selectors.split(',').count())
    }
}

impl ChunkEngine for SelectorBudget {
    fn chunk(&self, css: &str, request: &ChunkRequest<'_>) -> Result<ChunkResult, EngineError> {
        if css.matches('{').count() != css.matches('}').count() {
            return Err(EngineError::failed("unbalanced braces"));
        }

        let mut data = Vec::new();
        let mut current = String::new();
        let mut current_count = 0;
        let mut total_selector_count = 0;

        for rule in css.split_inclusive('}').filter(|rule| !rule.trim().is_empty()) {
            let count = Self::selectors(rule);
            total_selector_count += count;
            if current_count > 0 && current_count + count > self.max_selectors {
                data.push(std::mem::take(&mut current));
                current_count = 0;
            }
            current.push_str(rule);
            current_count += count;
        }
        if !current.is_empty() || data.is_empty() {
            data.push(current);
        }

        let maps = request.source_maps.then(|| {
            let source = request.source.display().to_string();
            data.iter()
                .map(|_| SourceMap {
                    sources: vec![source.clone()],
                    mappings: "AAAA".to_string(),
                    ..SourceMap::default()
                })
                .collect()
        });

        Ok(ChunkResult {
            data,
            maps,
            total_selector_count,
        })
    }
}

#[fixture]
pub fn two_selectors_per_file() -> SelectorBudget {
    init_tracing();
    SelectorBudget { max_selectors: 2 }
}
