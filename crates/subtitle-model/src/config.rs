//! Stage configuration types.
//!
//! Every field is explicit and serialized with a stable layout because the
//! serialized form feeds directly into stage cache fingerprints. Never
//! derive a config from runtime state.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Quality thresholds for the segment gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum visible characters for segments lasting one second or more.
    pub min_text_chars: usize,

    /// Maximum visible characters per second of speech.
    pub max_chars_per_sec: f64,

    /// Minimum share of script characters among alphanumerics, for
    /// languages with a known script.
    pub min_script_char_ratio: f64,

    /// Maximum share of the single most frequent non-whitespace character.
    pub max_repeated_char_ratio: f64,

    /// Drop segments containing nothing but punctuation and whitespace.
    pub drop_if_only_punctuation: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 2,
            max_chars_per_sec: 20.0,
            min_script_char_ratio: 0.30,
            max_repeated_char_ratio: 0.60,
            drop_if_only_punctuation: true,
        }
    }
}

impl GateConfig {
    /// Reject values that make the gate meaningless.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.max_chars_per_sec > 0.0) {
            return Err(ModelError::config("gate.max_chars_per_sec must be positive"));
        }
        for (name, value) in [
            ("gate.min_script_char_ratio", self.min_script_char_ratio),
            ("gate.max_repeated_char_ratio", self.max_repeated_char_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ModelError::config(format!("{name} must be within [0, 1]")));
            }
        }
        Ok(())
    }
}

/// Timing and layout limits for subtitle blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Largest silence (ms) bridged when merging neighbours.
    pub merge_gap_ms: u64,

    /// Longest allowed block (ms).
    pub max_block_ms: u64,

    /// Blocks shorter than this (ms) try to merge into a neighbour.
    pub min_block_ms: u64,

    /// Lines per displayed block.
    pub max_lines: usize,

    /// Characters per displayed line.
    pub chars_per_line: usize,

    /// Reading-speed target in visible characters per second.
    pub target_chars_per_sec: f64,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            merge_gap_ms: 250,
            max_block_ms: 6000,
            min_block_ms: 800,
            max_lines: 2,
            chars_per_line: 22,
            target_chars_per_sec: 12.0,
        }
    }
}

impl BlockConfig {
    /// Visible characters a block may hold: `max_lines * chars_per_line`.
    pub fn max_chars_per_block(&self) -> usize {
        self.max_lines * self.chars_per_line
    }

    /// Reject layouts that cannot hold any text.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.max_lines == 0 {
            return Err(ModelError::config("blocks.max_lines must be at least 1"));
        }
        if self.chars_per_line == 0 {
            return Err(ModelError::config("blocks.chars_per_line must be at least 1"));
        }
        if self.max_block_ms == 0 {
            return Err(ModelError::config("blocks.max_block_ms must be positive"));
        }
        if !(self.target_chars_per_sec > 0.0) {
            return Err(ModelError::config(
                "blocks.target_chars_per_sec must be positive",
            ));
        }
        Ok(())
    }

    /// Serializable snapshot including the derived block capacity.
    pub fn snapshot(&self) -> BlockConfigSnapshot {
        BlockConfigSnapshot {
            config: self.clone(),
            max_chars_per_block: self.max_chars_per_block(),
        }
    }
}

/// `BlockConfig` plus `max_chars_per_block`, as recorded in sidecars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockConfigSnapshot {
    #[serde(flatten)]
    pub config: BlockConfig,

    pub max_chars_per_block: usize,
}
