//! End-to-end driver: gate -> block-build -> normalize -> render.

use std::path::PathBuf;

use avsrt_common::{AppConfig, AvsrtError, AvsrtResult};
use avsrt_model::{BlockConfig, GateConfig};

use crate::stages::{
    probe_stage, run_stage, BlockStage, GateStage, NormalizeStage, RenderStage, StageOutcome,
    StageProbe, StageStatus,
};
use crate::workspace::Workspace;

/// The configured stage chain for one language.
#[derive(Debug, Clone)]
pub struct Pipeline {
    language: String,
    gate: GateConfig,
    blocks: BlockConfig,
    render: Option<BlockConfig>,
}

/// What a full run did.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub stages: Vec<StageOutcome>,
    /// The subtitle track written (or reused) by the render stage.
    pub output_path: PathBuf,
}

impl PipelineReport {
    /// True when every stage was served from cache.
    pub fn all_cached(&self) -> bool {
        self.stages.iter().all(|s| s.status == StageStatus::Hit)
    }
}

impl Pipeline {
    pub fn new(config: &AppConfig) -> AvsrtResult<Self> {
        config.validate()?;
        Ok(Self {
            language: config.language.clone(),
            gate: config.gate.clone(),
            blocks: config.blocks.clone(),
            render: None,
        })
    }

    /// Render with `config` instead of the configuration recorded by the
    /// last block build.
    pub fn with_render_config(mut self, config: BlockConfig) -> AvsrtResult<Self> {
        config
            .validate()
            .map_err(|e| AvsrtError::config(e.to_string()))?;
        self.render = Some(config);
        Ok(self)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(&self, ws: &Workspace) -> AvsrtResult<PipelineReport> {
        let span = tracing::info_span!("pipeline", language = %self.language);
        let _guard = span.enter();

        let mut stages = Vec::with_capacity(4);
        stages.push(run_stage(&GateStage::new(&self.language, self.gate.clone()), ws)?);
        stages.push(run_stage(&BlockStage::new(&self.language, self.blocks.clone()), ws)?);
        stages.push(run_stage(&NormalizeStage::new(&self.language), ws)?);

        // Resolved after block-build so a fresh sidecar is picked up.
        let render = RenderStage::resolve(ws, &self.language, self.render.clone());
        stages.push(run_stage(&render, ws)?);

        let report = PipelineReport {
            stages,
            output_path: render.output_path().clone(),
        };
        tracing::info!(
            output = %report.output_path.display(),
            all_cached = report.all_cached(),
            "pipeline finished"
        );
        Ok(report)
    }

    /// Report, per stage, whether a run would reuse its artifact.
    ///
    /// Each stage is probed against what is on disk now, so a stage whose
    /// upstream is stale still reports on the upstream as it currently is.
    pub fn probe(&self, ws: &Workspace) -> AvsrtResult<Vec<(&'static str, StageProbe)>> {
        let render = RenderStage::resolve(ws, &self.language, self.render.clone());
        Ok(vec![
            (
                crate::stages::gate::STAGE,
                probe_stage(&GateStage::new(&self.language, self.gate.clone()), ws)?,
            ),
            (
                crate::stages::blocks::STAGE,
                probe_stage(&BlockStage::new(&self.language, self.blocks.clone()), ws)?,
            ),
            (
                crate::stages::normalize::STAGE,
                probe_stage(&NormalizeStage::new(&self.language), ws)?,
            ),
            (crate::stages::render::STAGE, probe_stage(&render, ws)?),
        ])
    }
}
