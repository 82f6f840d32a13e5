//! Block builder: gated segments in, constrained subtitle blocks out.
//!
//! Three passes run in order:
//!
//! - Phase A ([`greedy_merge`]) packs neighbouring segments together with
//!   a small reading-rate tolerance.
//! - Phase B ([`enforce_constraints`]) splits anything still over a
//!   ceiling, on segment boundaries first and inside the text otherwise.
//! - Phase C ([`consolidate_short_blocks`]) folds leftover short blocks
//!   into a neighbour, re-checking every ceiling on the merged result.
//!
//! Output is sorted by `(start_ms, end_ms)` and the whole build is
//! deterministic for a given input and configuration.

use std::fmt;

use avsrt_model::{text_joiner, Block, BlockConfig, BlockRecord, Segment};

use crate::consolidate::consolidate_short_blocks;
use crate::merge::greedy_merge;
use crate::split::enforce_constraints;

/// A non-fatal condition met while building blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// A block exceeded a ceiling but its span was too short to divide.
    Unsplittable {
        start_ms: u64,
        end_ms: u64,
        chars: usize,
    },
    /// A block had no segment boundary to split on and was cut inside its
    /// text instead.
    BoundaryFallback { start_ms: u64, end_ms: u64 },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::Unsplittable {
                start_ms,
                end_ms,
                chars,
            } => write!(
                f,
                "warn unsplittable start_ms={start_ms} end_ms={end_ms} chars={chars}"
            ),
            BuildWarning::BoundaryFallback { start_ms, end_ms } => write!(
                f,
                "warn boundary fallback start_ms={start_ms} end_ms={end_ms} split=in-text"
            ),
        }
    }
}

/// Result of a build.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    /// Final blocks, sorted by `(start_ms, end_ms)`.
    pub blocks: Vec<Block>,
    pub warnings: Vec<BuildWarning>,
}

impl BuildOutcome {
    /// Blocks numbered from 1, ready to be written out.
    pub fn records(&self) -> Vec<BlockRecord> {
        BlockRecord::number(&self.blocks)
    }
}

/// Turns gated segments into subtitle blocks.
pub struct BlockBuilder {
    config: BlockConfig,
    joiner: &'static str,
}

impl BlockBuilder {
    /// Create a builder for text in `language`.
    pub fn new(config: BlockConfig, language: &str) -> Self {
        Self {
            config,
            joiner: text_joiner(language),
        }
    }

    /// Create a builder with default limits.
    pub fn with_defaults(language: &str) -> Self {
        Self::new(BlockConfig::default(), language)
    }

    pub fn config(&self) -> &BlockConfig {
        &self.config
    }

    /// Run all three phases over `segments`.
    ///
    /// Segments are sorted by `(start_ms, end_ms)` first; callers are
    /// expected to have validated them.
    pub fn build(&self, segments: &[Segment]) -> BuildOutcome {
        let mut sorted = segments.to_vec();
        avsrt_model::sort_segments(&mut sorted);

        let merged = greedy_merge(&sorted, &self.config, self.joiner);
        let merged_count = merged.len();

        let enforced = enforce_constraints(merged, &self.config, self.joiner);
        let mut blocks = enforced.blocks;
        sort_blocks(&mut blocks);

        let mut blocks = consolidate_short_blocks(blocks, &self.config, self.joiner);
        sort_blocks(&mut blocks);

        tracing::debug!(
            segments = sorted.len(),
            merged = merged_count,
            blocks = blocks.len(),
            warnings = enforced.warnings.len(),
            "built subtitle blocks"
        );

        BuildOutcome {
            blocks,
            warnings: enforced.warnings,
        }
    }
}

fn sort_blocks(blocks: &mut [Block]) {
    blocks.sort_by_key(|block| (block.start_ms, block.end_ms));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_config() -> BlockConfig {
        BlockConfig {
            merge_gap_ms: 150,
            max_block_ms: 6000,
            max_lines: 2,
            chars_per_line: 5,
            target_chars_per_sec: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_then_split() {
        let segments = vec![
            Segment::new(0, 0, 500, "ああああ"),
            Segment::new(1, 600, 1100, "いいい"),
            Segment::new(2, 3000, 9000, "かかかかか。きききききき"),
        ];
        let outcome = BlockBuilder::new(scenario_config(), "ja").build(&segments);
        let spans: Vec<(u64, u64, &str)> = outcome
            .blocks
            .iter()
            .map(|b| (b.start_ms, b.end_ms, b.text.as_str()))
            .collect();
        assert_eq!(
            spans,
            vec![
                (0, 1100, "ああああいいい"),
                (3000, 6000, "かかかかか。"),
                (6000, 9000, "きききききき"),
            ]
        );
        assert_eq!(
            outcome.warnings,
            vec![BuildWarning::BoundaryFallback {
                start_ms: 3000,
                end_ms: 9000
            }]
        );

        let records = outcome.records();
        assert_eq!(records.iter().map(|r| r.block_id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let segments = vec![
            Segment::new(1, 5000, 6000, "いいい"),
            Segment::new(0, 0, 1000, "あああ"),
        ];
        let outcome = BlockBuilder::with_defaults("ja").build(&segments);
        assert_eq!(outcome.blocks[0].text, "あああ");
        assert_eq!(outcome.blocks[1].text, "いいい");
    }

    #[test]
    fn test_empty_input() {
        let outcome = BlockBuilder::with_defaults("ja").build(&[]);
        assert!(outcome.blocks.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_warning_display() {
        let warning = BuildWarning::Unsplittable {
            start_ms: 0,
            end_ms: 1,
            chars: 100,
        };
        assert_eq!(
            warning.to_string(),
            "warn unsplittable start_ms=0 end_ms=1 chars=100"
        );
    }
}
