//! Run the subtitle pipeline.

use std::path::PathBuf;

use anyhow::Context;
use avsrt_common::AppConfig;
use avsrt_pipeline::{Pipeline, StageStatus, Workspace};

pub fn run(media: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let ws = Workspace::resolve(&media)
        .map_err(|e| anyhow::anyhow!("Failed to prepare workspace: {e}"))?;
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;

    println!("Building {} subtitles for {}", config.language, ws.media().file_name);
    println!("  Workspace: {}", ws.work_dir().display());

    let report = match pipeline.run(&ws) {
        Ok(report) => report,
        Err(e) if e.is_artifact_error() => {
            anyhow::bail!(
                "{e}\nFix or replace the artifact in {} and run again.",
                ws.work_dir().display()
            )
        }
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!(
                "Pipeline failed; see {}",
                ws.run_log().path().display()
            )))
        }
    };

    println!();
    for outcome in &report.stages {
        match outcome.status {
            StageStatus::Hit => println!("  [cached] {}", outcome.stage),
            StageStatus::Recomputed(reason) => {
                println!("  [built]  {} ({reason})", outcome.stage)
            }
        }
    }
    println!();
    println!("Subtitles: {}", report.output_path.display());

    Ok(())
}
