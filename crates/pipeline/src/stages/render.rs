//! Render stage: `subtitle_blocks.normalized.json` -> `<stem>.<language>.srt`.
//!
//! Each block is wrapped to the configured width. A block whose text does
//! not fit in `max_lines` lines is split in time and text and both halves
//! are wrapped again; a block too short to split is emitted with its
//! overflowing last line instead.

use std::collections::VecDeque;
use std::path::PathBuf;

use avsrt_common::{sha256_hex, AvsrtError, AvsrtResult};
use avsrt_model::{
    render_subtitles, Block, BlockConfig, BlockConfigSnapshot, BlockRecord, Segment, SubtitleEntry,
};
use avsrt_segmenter::split::split_inside_text;
use avsrt_segmenter::wrap_text;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::blocks::BlockMeta;
use super::{Computed, Stage, BLOCKS_META, NORMALIZED_BLOCKS, RENDER_META};
use crate::cache::{CacheKey, Sidecar};
use crate::workspace::Workspace;

pub const STAGE: &str = "render";
pub const VERSION: u32 = 1;

/// Contents of `render.meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderMeta {
    pub stage: String,
    pub version: u32,
    pub input_fingerprint: String,
    pub normalized_blocks_sha256: String,
    pub wrap_config: BlockConfigSnapshot,
    pub output_path: String,
    pub output_sha256: String,
}

impl Sidecar for RenderMeta {
    fn stage(&self) -> &str {
        &self.stage
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn config(&self) -> Value {
        config_value(&self.wrap_config, &self.output_path)
    }

    fn input_fingerprint(&self) -> &str {
        &self.input_fingerprint
    }

    fn output_sha256(&self) -> &str {
        &self.output_sha256
    }
}

fn config_value(wrap_config: &BlockConfigSnapshot, output_path: &str) -> Value {
    json!({ "wrap_config": wrap_config, "output_path": output_path })
}

/// Wraps normalized blocks and writes the subtitle track.
#[derive(Debug, Clone)]
pub struct RenderStage {
    config: BlockConfig,
    output_path: PathBuf,
}

impl RenderStage {
    /// Render with `config`, or with the configuration the last block
    /// build recorded, or with defaults, in that order of preference.
    pub fn resolve(ws: &Workspace, language: &str, explicit: Option<BlockConfig>) -> Self {
        let config = explicit
            .or_else(|| BlockMeta::recorded_config(&ws.artifact_path(BLOCKS_META)))
            .unwrap_or_default();
        Self {
            config,
            output_path: ws.subtitle_path(language),
        }
    }

    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }

    fn prepare_entries(
        &self,
        ws: &Workspace,
        records: Vec<BlockRecord>,
    ) -> AvsrtResult<Vec<SubtitleEntry>> {
        let (width, max_lines) = (self.config.chars_per_line, self.config.max_lines);
        let log = ws.run_log();

        let mut queue: VecDeque<(u32, Block)> = records
            .into_iter()
            .map(|record| {
                let segment = Segment::new(
                    u64::from(record.block_id),
                    record.start_ms,
                    record.end_ms,
                    record.text,
                );
                (record.block_id, Block::from_segment(segment))
            })
            .collect();

        let mut prepared: Vec<(Block, Vec<String>)> = Vec::with_capacity(queue.len());
        while let Some((block_id, block)) = queue.pop_front() {
            let wrapped = wrap_text(&block.text, width, max_lines);
            if !wrapped.overflowed {
                prepared.push((block, wrapped.lines));
                continue;
            }

            match split_inside_text(&block) {
                Some((left, right)) => {
                    log.append(format!("{STAGE}: warn split block_id={block_id}"))?;
                    queue.push_front((block_id, right));
                    queue.push_front((block_id, left));
                }
                None => {
                    log.append(format!(
                        "{STAGE}: warn unsplittable block_id={block_id} duration_ms={} forcing wrap",
                        block.duration_ms()
                    ))?;
                    tracing::warn!(
                        block_id,
                        duration_ms = block.duration_ms(),
                        "block cannot be split further, forcing wrap"
                    );
                    prepared.push((block, wrapped.lines));
                }
            }
        }

        Ok(prepared
            .into_iter()
            .enumerate()
            .map(|(idx, (block, lines))| {
                SubtitleEntry::from_millis(
                    idx as u32 + 1,
                    block.start_ms as i64,
                    block.end_ms as i64,
                    lines,
                )
            })
            .collect())
    }
}

impl Stage for RenderStage {
    type Meta = RenderMeta;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn upstream_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(NORMALIZED_BLOCKS)
    }

    fn artifact_path(&self, _ws: &Workspace) -> PathBuf {
        self.output_path.clone()
    }

    fn meta_path(&self, ws: &Workspace) -> PathBuf {
        ws.artifact_path(RENDER_META)
    }

    fn config(&self) -> AvsrtResult<Value> {
        Ok(config_value(
            &self.config.snapshot(),
            &self.output_path.to_string_lossy(),
        ))
    }

    fn compute(
        &self,
        ws: &Workspace,
        upstream: &[u8],
        key: &CacheKey,
    ) -> AvsrtResult<Computed<RenderMeta>> {
        let records: Vec<BlockRecord> = serde_json::from_slice(upstream).map_err(|e| {
            AvsrtError::schema(STAGE, self.upstream_path(ws), e.to_string())
        })?;
        if let Some(bad) = records.iter().find(|r| r.end_ms < r.start_ms) {
            return Err(AvsrtError::schema(
                STAGE,
                self.upstream_path(ws),
                format!("block {} ends before it starts", bad.block_id),
            ));
        }

        let entries = self.prepare_entries(ws, records)?;
        let bytes = render_subtitles(&entries).into_bytes();
        let meta = RenderMeta {
            stage: STAGE.to_string(),
            version: VERSION,
            input_fingerprint: key.input_fingerprint.clone(),
            normalized_blocks_sha256: sha256_hex(upstream),
            wrap_config: self.config.snapshot(),
            output_path: self.output_path.to_string_lossy().into_owned(),
            output_sha256: sha256_hex(&bytes),
        };
        Ok(Computed { bytes, meta })
    }
}
