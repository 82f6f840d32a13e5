//! Block-build stage: `segments.gated.json` -> `subtitle_blocks.json`.

use std::path::{Path, PathBuf};

use avsrt_common::{read_json, sha256_hex, to_canonical_json, AvsrtError, AvsrtResult};
use avsrt_model::{sort_segments, validate_segments, BlockConfig, BlockConfigSnapshot, Segment};
use avsrt_segmenter::BlockBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Computed, Stage, BLOCKS, BLOCKS_META, GATED_SEGMENTS};
use crate::cache::{CacheKey, Sidecar};
use crate::workspace::Workspace;

pub const STAGE: &str = "block-build";
pub const VERSION: u32 = 1;

/// Contents of `subtitle_blocks.meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMeta {
    pub stage: String,
    pub version: u32,
    pub language: String,
    pub input_fingerprint: String,
    pub config: BlockConfigSnapshot,
    pub blocks_sha256: String,
}

impl BlockMeta {
    /// Read the block configuration recorded by the last committed build.
    pub fn recorded_config(meta_path: &Path) -> Option<BlockConfig> {
        let meta: BlockMeta = read_json(meta_path).ok()?;
        Some(meta.config.config)
    }
}

impl Sidecar for BlockMeta {
    fn stage(&self) -> &str {
        &self.stage
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn config(&self) -> Value {
        config_value(&self.language, &self.config)
    }

    fn input_fingerprint(&self) -> &str {
        &self.input_fingerprint
    }

    fn output_sha256(&self) -> &str {
        &self.blocks_sha256
    }
}

fn config_value(language: &str, snapshot: &BlockConfigSnapshot) -> Value {
    json!({ "language": language, "blocks": snapshot })
}

/// Builds subtitle blocks from gated segments.
#[derive(Debug, Clone)]
pub struct BlockStage {
    language: String,
    config: BlockConfig,
}

impl BlockStage {
    pub fn new(language: impl Into<String>, config: BlockConfig) -> Self {
        Self {
            language: language.into(),
            config,
        }
    }
}

impl Stage for BlockStage {
    type Meta = BlockMeta;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn upstream_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(GATED_SEGMENTS)
    }

    fn artifact_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(BLOCKS)
    }

    fn meta_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(BLOCKS_META)
    }

    fn config(&self) -> AvsrtResult<Value> {
        Ok(config_value(&self.language, &self.config.snapshot()))
    }

    fn compute(
        &self,
        ws: &Workspace,
        upstream: &[u8],
        key: &CacheKey,
    ) -> AvsrtResult<Computed<BlockMeta>> {
        let upstream_path = self.upstream_path(ws);
        let mut segments: Vec<Segment> = serde_json::from_slice(upstream)
            .map_err(|e| AvsrtError::schema(STAGE, &upstream_path, e.to_string()))?;
        sort_segments(&mut segments);
        validate_segments(&segments)
            .map_err(|e| AvsrtError::schema(STAGE, &upstream_path, e.to_string()))?;

        let outcome = BlockBuilder::new(self.config.clone(), &self.language).build(&segments);

        let log = ws.run_log();
        for warning in &outcome.warnings {
            log.append(format!("{STAGE}: {warning}"))?;
        }
        log.append(format!(
            "{STAGE}: {} segments -> {} blocks",
            segments.len(),
            outcome.blocks.len()
        ))?;

        let bytes = to_canonical_json(&outcome.records())?;
        let meta = BlockMeta {
            stage: STAGE.to_string(),
            version: VERSION,
            language: self.language.clone(),
            input_fingerprint: key.input_fingerprint.clone(),
            config: self.config.snapshot(),
            blocks_sha256: sha256_hex(&bytes),
        };
        Ok(Computed { bytes, meta })
    }
}
