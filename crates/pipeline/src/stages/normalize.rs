//! Normalize stage: `subtitle_blocks.json` -> `subtitle_blocks.normalized.json`.
//!
//! Only block text changes; ids and timings are carried over untouched.

use std::path::PathBuf;

use avsrt_common::{sha256_hex, to_canonical_json, AvsrtError, AvsrtResult};
use avsrt_model::BlockRecord;
use avsrt_segmenter::normalize_text;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Computed, Stage, BLOCKS, NORMALIZED_BLOCKS, NORMALIZED_META};
use crate::cache::{CacheKey, Sidecar};
use crate::workspace::Workspace;

pub const STAGE: &str = "normalize";
pub const VERSION: u32 = 1;

/// Contents of `subtitle_blocks.normalized.meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeMeta {
    pub stage: String,
    pub version: u32,
    pub language: String,
    pub input_fingerprint: String,
    pub normalized_blocks_sha256: String,
}

impl Sidecar for NormalizeMeta {
    fn stage(&self) -> &str {
        &self.stage
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn config(&self) -> Value {
        json!({ "language": self.language })
    }

    fn input_fingerprint(&self) -> &str {
        &self.input_fingerprint
    }

    fn output_sha256(&self) -> &str {
        &self.normalized_blocks_sha256
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeStage {
    language: String,
}

impl NormalizeStage {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

impl Stage for NormalizeStage {
    type Meta = NormalizeMeta;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn upstream_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(BLOCKS)
    }

    fn artifact_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(NORMALIZED_BLOCKS)
    }

    fn meta_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(NORMALIZED_META)
    }

    fn config(&self) -> AvsrtResult<Value> {
        Ok(json!({ "language": self.language }))
    }

    fn compute(
        &self,
        ws: &Workspace,
        upstream: &[u8],
        key: &CacheKey,
    ) -> AvsrtResult<Computed<NormalizeMeta>> {
        let records: Vec<BlockRecord> = serde_json::from_slice(upstream).map_err(|e| {
            AvsrtError::schema(STAGE, self.upstream_path(ws), e.to_string())
        })?;

        let normalized: Vec<BlockRecord> = records
            .into_iter()
            .map(|record| BlockRecord {
                text: normalize_text(&record.text, &self.language),
                ..record
            })
            .collect();

        let bytes = to_canonical_json(&normalized)?;
        let meta = NormalizeMeta {
            stage: STAGE.to_string(),
            version: VERSION,
            language: self.language.clone(),
            input_fingerprint: key.input_fingerprint.clone(),
            normalized_blocks_sha256: sha256_hex(&bytes),
        };
        Ok(Computed { bytes, meta })
    }
}
