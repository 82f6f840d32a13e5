//! Translation of a rendered subtitle track.
//!
//! The translation engine itself lives outside this crate and plugs in
//! through [`Translator`]. Entries keep their index and timing; only the
//! text lines are replaced.

use std::fs;
use std::path::PathBuf;

use avsrt_common::{atomic_write_bytes, AvsrtError, AvsrtResult};
use avsrt_model::{parse_subtitles, render_subtitles, SubtitleEntry};

use crate::workspace::Workspace;

pub const STAGE: &str = "translate";

/// Texts sent to the translator per request.
pub const TRANSLATE_BATCH_SIZE: usize = 100;

/// A machine translation backend.
///
/// Backend failures that have no dedicated variant can be returned as
/// `anyhow::Error`; they convert into [`AvsrtError::Other`].
pub trait Translator {
    /// Translate `texts` from `source` to `target`, returning exactly one
    /// translation per input, in order.
    fn translate_batch(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> AvsrtResult<Vec<String>>;
}

/// Translate the `source` track of `ws` into `<stem>.<target>.srt`.
///
/// An existing target track is kept as-is unless `overwrite` is set.
pub fn translate_subtitles(
    ws: &Workspace,
    source: &str,
    target: &str,
    translator: &dyn Translator,
    overwrite: bool,
) -> AvsrtResult<PathBuf> {
    let log = ws.run_log();
    let source_path = ws.subtitle_path(source);
    let output_path = ws.subtitle_path(target);

    if !source_path.exists() {
        log.append(format!("{STAGE}: missing {}", source_path.display()))?;
        return Err(AvsrtError::missing_upstream(STAGE, source_path));
    }
    if output_path.exists() && !overwrite {
        log.append(format!("{STAGE}: skip (exists) -> {}", output_path.display()))?;
        return Ok(output_path);
    }

    let content = fs::read_to_string(&source_path)?;
    let entries = parse_subtitles(&content)
        .map_err(|e| AvsrtError::schema(STAGE, &source_path, e.to_string()))?;
    let texts: Vec<String> = entries.iter().map(|entry| entry.lines.join("\n")).collect();
    let batches = texts.len().div_ceil(TRANSLATE_BATCH_SIZE);

    log.append(format!(
        "{STAGE}: start entries={} batches={batches}",
        entries.len()
    ))?;
    tracing::info!(source, target, entries = entries.len(), batches, "translating subtitles");

    let mut translated: Vec<String> = Vec::with_capacity(texts.len());
    for batch in texts.chunks(TRANSLATE_BATCH_SIZE) {
        let result = translator.translate_batch(batch, source, target)?;
        if result.len() != batch.len() {
            return Err(AvsrtError::translation(format!(
                "expected {} translations, got {}",
                batch.len(),
                result.len()
            )));
        }
        translated.extend(result);
    }

    let translated_entries: Vec<SubtitleEntry> = entries
        .into_iter()
        .zip(translated)
        .map(|(entry, text)| SubtitleEntry {
            lines: text
                .split('\n')
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect(),
            ..entry
        })
        .collect();

    atomic_write_bytes(&output_path, render_subtitles(&translated_entries).as_bytes())?;
    log.append(format!(
        "{STAGE}: ok -> {} entries={} batches={batches}",
        output_path.display(),
        translated_entries.len()
    ))?;
    Ok(output_path)
}
