//! Pipeline stages and the driver that applies the cache protocol to them.
//!
//! A stage reads one upstream artifact and produces one artifact plus its
//! sidecar. [`run_stage`] owns everything around the computation itself:
//! the missing-upstream check, fingerprinting, the cache lookup, the
//! atomic commit and the run-log trail.

pub mod blocks;
pub mod gate;
pub mod normalize;
pub mod render;
pub mod translate;

use std::fs;
use std::path::{Path, PathBuf};

use avsrt_common::{AvsrtError, AvsrtResult};
use serde_json::Value;

use crate::cache::{self, CacheKey, CacheLookup, MissReason, Sidecar};
use crate::workspace::Workspace;

pub use blocks::BlockStage;
pub use gate::GateStage;
pub use normalize::NormalizeStage;
pub use render::RenderStage;
pub use translate::{translate_subtitles, Translator};

/// Recognized segments, produced outside this crate.
pub const ASR_SEGMENTS: &str = "segments.asr.json";
pub const GATED_SEGMENTS: &str = "segments.gated.json";
pub const GATE_META: &str = "segments.gated.meta.json";
pub const BLOCKS: &str = "subtitle_blocks.json";
pub const BLOCKS_META: &str = "subtitle_blocks.meta.json";
pub const NORMALIZED_BLOCKS: &str = "subtitle_blocks.normalized.json";
pub const NORMALIZED_META: &str = "subtitle_blocks.normalized.meta.json";
pub const RENDER_META: &str = "render.meta.json";

/// Artifact bytes and the sidecar describing them.
pub struct Computed<M> {
    pub bytes: Vec<u8>,
    pub meta: M,
}

/// One cacheable step of the pipeline.
pub trait Stage {
    type Meta: Sidecar;

    fn name(&self) -> &'static str;
    fn version(&self) -> u32;
    fn upstream_path(&self, ws: &Workspace) -> PathBuf;
    fn artifact_path(&self, ws: &Workspace) -> PathBuf;
    fn meta_path(&self, ws: &Workspace) -> PathBuf;

    /// Everything besides the upstream bytes that affects the output.
    fn config(&self) -> AvsrtResult<Value>;

    /// Produce the artifact from the upstream bytes.
    fn compute(
        &self,
        ws: &Workspace,
        upstream: &[u8],
        key: &CacheKey,
    ) -> AvsrtResult<Computed<Self::Meta>>;
}

/// How a stage run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// The cached artifact was reused; nothing was written.
    Hit,
    /// The artifact was recomputed and committed.
    Recomputed(MissReason),
}

/// Result of running one stage.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: &'static str,
    pub status: StageStatus,
    pub artifact: PathBuf,
}

/// What running a stage would do, without running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageProbe {
    MissingUpstream(PathBuf),
    Cached,
    Stale(MissReason),
}

/// Run `stage` under the cache protocol.
pub fn run_stage<S: Stage>(stage: &S, ws: &Workspace) -> AvsrtResult<StageOutcome> {
    let name = stage.name();
    let log = ws.run_log();
    let upstream = stage.upstream_path(ws);
    if !upstream.exists() {
        log.append(format!("{name}: missing {}", display_name(&upstream)))?;
        return Err(AvsrtError::missing_upstream(name, upstream));
    }

    let upstream_bytes = fs::read(&upstream)?;
    let key = CacheKey::new(name, stage.version(), &stage.config()?, &upstream_bytes)?;
    let artifact = stage.artifact_path(ws);
    let meta_path = stage.meta_path(ws);

    let reason = match cache::lookup::<S::Meta>(&artifact, &meta_path, &key)? {
        CacheLookup::Hit(_) => {
            log.append(format!("{name}: skip (cache hit)"))?;
            tracing::debug!(stage = name, "cache hit");
            return Ok(StageOutcome {
                stage: name,
                status: StageStatus::Hit,
                artifact,
            });
        }
        CacheLookup::Miss(reason) => reason,
    };

    log.append(format!("{name}: start ({reason})"))?;
    tracing::info!(stage = name, %reason, "stage started");

    let computed = match stage.compute(ws, &upstream_bytes, &key) {
        Ok(computed) => computed,
        Err(e) => {
            log.append(format!("{name}: failed: {e}"))?;
            return Err(e);
        }
    };
    cache::commit(&artifact, &computed.bytes, &meta_path, &computed.meta)?;

    log.append(format!("{name}: ok -> {}", display_name(&artifact)))?;
    tracing::info!(stage = name, artifact = %artifact.display(), "stage committed");
    Ok(StageOutcome {
        stage: name,
        status: StageStatus::Recomputed(reason),
        artifact,
    })
}

/// Check what [`run_stage`] would do. Performs no writes.
pub fn probe_stage<S: Stage>(stage: &S, ws: &Workspace) -> AvsrtResult<StageProbe> {
    let upstream = stage.upstream_path(ws);
    if !upstream.exists() {
        return Ok(StageProbe::MissingUpstream(upstream));
    }
    let upstream_bytes = fs::read(&upstream)?;
    let key = CacheKey::new(stage.name(), stage.version(), &stage.config()?, &upstream_bytes)?;
    let lookup = cache::lookup::<S::Meta>(&stage.artifact_path(ws), &stage.meta_path(ws), &key)?;
    let probe = match lookup {
        CacheLookup::Hit(_) => StageProbe::Cached,
        CacheLookup::Miss(reason) => StageProbe::Stale(reason),
    };
    Ok(probe)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
