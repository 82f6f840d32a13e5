//! Show which pipeline stages would be reused.

use std::path::PathBuf;

use anyhow::Context;
use avsrt_common::AppConfig;
use avsrt_pipeline::{Pipeline, StageProbe, Workspace};

pub fn run(media: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let Some(ws) = Workspace::find(&media)
        .map_err(|e| anyhow::anyhow!("Failed to inspect {}: {e}", media.display()))?
    else {
        println!("No workspace for {}. Run `avsrt init` first.", media.display());
        return Ok(());
    };

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let probes = pipeline.probe(&ws)?;

    println!("Workspace: {}", ws.work_dir().display());
    for (stage, probe) in &probes {
        match probe {
            StageProbe::Cached => println!("  [OK]    {stage}: cached"),
            StageProbe::Stale(reason) => println!("  [STALE] {stage}: {reason}"),
            StageProbe::MissingUpstream(path) => {
                println!("  [WAIT]  {stage}: missing {}", path.display())
            }
        }
    }

    let pending = probes
        .iter()
        .filter(|(_, p)| *p != StageProbe::Cached)
        .count();
    println!();
    if pending == 0 {
        println!("Up to date: {}", ws.subtitle_path(pipeline.language()).display());
    } else {
        println!("{pending} stage(s) would run.");
    }

    Ok(())
}
