//! Gate stage: `segments.asr.json` -> `segments.gated.json`.

use std::path::PathBuf;

use avsrt_common::{sha256_hex, to_canonical_json, AvsrtError, AvsrtResult};
use avsrt_model::{validate_segments, GateConfig, Segment};
use avsrt_segmenter::SegmentGate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Computed, Stage, ASR_SEGMENTS, GATED_SEGMENTS, GATE_META};
use crate::cache::{CacheKey, Sidecar};
use crate::workspace::Workspace;

pub const STAGE: &str = "gate";
pub const VERSION: u32 = 1;

/// Drop events written individually to the run log per run.
const MAX_LOGGED_DROPS: usize = 10;

/// Contents of `segments.gated.meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateMeta {
    pub stage: String,
    pub version: u32,
    pub language: String,
    pub input_fingerprint: String,
    pub config: GateConfig,
    pub input_count: usize,
    pub gated_sha256: String,
}

impl Sidecar for GateMeta {
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
        &self.gated_sha256
    }
}

fn config_value(language: &str, config: &GateConfig) -> Value {
    json!({ "language": language, "gate": config })
}

/// Filters recognized segments through [`SegmentGate`].
#[derive(Debug, Clone)]
pub struct GateStage {
    language: String,
    config: GateConfig,
}

impl GateStage {
    pub fn new(language: impl Into<String>, config: GateConfig) -> Self {
        Self {
            language: language.into(),
            config,
        }
    }
}

impl Stage for GateStage {
    type Meta = GateMeta;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn upstream_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(ASR_SEGMENTS)
    }

    fn artifact_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(GATED_SEGMENTS)
    }

    fn meta_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(GATE_META)
    }

    fn config(&self) -> AvsrtResult<Value> {
        Ok(config_value(&self.language, &self.config))
    }

    fn compute(
        &self,
        ws: &Workspace,
        upstream: &[u8],
        key: &CacheKey,
    ) -> AvsrtResult<Computed<GateMeta>> {
        let upstream_path = self.upstream_path(ws);
        let segments: Vec<Segment> = serde_json::from_slice(upstream)
            .map_err(|e| AvsrtError::schema(STAGE, &upstream_path, e.to_string()))?;
        validate_segments(&segments)
            .map_err(|e| AvsrtError::schema(STAGE, &upstream_path, e.to_string()))?;

        let outcome = SegmentGate::new(self.config.clone(), &self.language).apply(&segments);

        let log = ws.run_log();
        for dropped in outcome.dropped.iter().take(MAX_LOGGED_DROPS) {
            log.append(format!(
                "{STAGE}: drop seg_id={} reason={}",
                dropped.seg_id, dropped.reason
            ))?;
        }
        if outcome.dropped.len() > MAX_LOGGED_DROPS {
            log.append(format!(
                "{STAGE}: {} more drops not listed",
                outcome.dropped.len() - MAX_LOGGED_DROPS
            ))?;
        }
        log.append(format!(
            "{STAGE}: kept {} of {} segments",
            outcome.kept.len(),
            outcome.total()
        ))?;
        tracing::info!(
            kept = outcome.kept.len(),
            dropped = outcome.dropped.len(),
            "gated segments"
        );

        let bytes = to_canonical_json(&outcome.kept)?;
        let meta = GateMeta {
            stage: STAGE.to_string(),
            version: VERSION,
            language: self.language.clone(),
            input_fingerprint: key.input_fingerprint.clone(),
            config: self.config.clone(),
            input_count: segments.len(),
            gated_sha256: sha256_hex(&bytes),
        };
        Ok(Computed { bytes, meta })
    }
}
