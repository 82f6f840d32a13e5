//! Check a subtitle file against the layout limits.

use std::path::PathBuf;

use avsrt_common::AppConfig;
use avsrt_model::{parse_subtitles, parse_timestamp};

pub fn run(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    println!("Checking subtitles at: {}", path.display());

    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let entries =
        parse_subtitles(&content).map_err(|e| anyhow::anyhow!("Failed to parse subtitles: {e}"))?;

    let limits = &config.blocks;
    println!("  Entries: {}", entries.len());
    println!(
        "  Limits: {} line(s) x {} chars",
        limits.max_lines, limits.chars_per_line
    );

    let mut issues = Vec::new();
    let mut previous_start = 0;
    for (position, entry) in entries.iter().enumerate() {
        if entry.index as usize != position + 1 {
            issues.push(format!(
                "entry {}: expected index {}",
                entry.index,
                position + 1
            ));
        }

        let start = parse_timestamp(&entry.start_ts)?;
        let end = parse_timestamp(&entry.end_ts)?;
        if end < start {
            issues.push(format!("entry {}: ends before it starts", entry.index));
        }
        if start < previous_start {
            issues.push(format!("entry {}: starts before the previous entry", entry.index));
        }
        previous_start = start;

        if entry.lines.len() > limits.max_lines {
            issues.push(format!(
                "entry {}: {} lines (max {})",
                entry.index,
                entry.lines.len(),
                limits.max_lines
            ));
        }
        for line in &entry.lines {
            let width = line.chars().count();
            if width > limits.chars_per_line {
                issues.push(format!(
                    "entry {}: line of {width} chars (max {})",
                    entry.index, limits.chars_per_line
                ));
            }
        }
    }

    if issues.is_empty() {
        println!("\nSubtitles are within limits.");
    } else {
        println!("\nIssues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!(
            "\n{} issue(s) found. Forced wraps from very short blocks are expected to exceed the width.",
            issues.len()
        );
    }

    Ok(())
}
