//! Create or locate the workspace for a media file.

use std::path::PathBuf;

use avsrt_pipeline::stages::ASR_SEGMENTS;
use avsrt_pipeline::Workspace;

pub fn run(media: PathBuf) -> anyhow::Result<()> {
    let ws = Workspace::resolve(&media)
        .map_err(|e| anyhow::anyhow!("Failed to prepare workspace: {e}"))?;
    let record = ws.media();

    println!("Workspace for {}", record.file_name);
    println!("  Directory: {}", ws.work_dir().display());
    println!("  Size: {} bytes", record.fingerprint.size_bytes);
    println!("  Created: {}", record.created_at);
    println!();

    let segments = ws.artifact_path(ASR_SEGMENTS);
    if segments.exists() {
        println!("Recognized segments found: {}", segments.display());
    } else {
        println!("Place recognized segments at:");
        println!("  {}", segments.display());
    }

    Ok(())
}
