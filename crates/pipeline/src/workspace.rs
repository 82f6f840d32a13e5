//! Per-media working directories.
//!
//! A media file `<dir>/<stem>.<ext>` gets its artifacts under
//! `<dir>/<stem>.avsrt`. When that directory already belongs to a
//! different file (or to an earlier version of the same file), numbered
//! siblings `<stem>.avsrt.001`, `<stem>.avsrt.002`, ... are tried in
//! order. A directory is reused only when its `media.json` records the
//! same path, size and modification time; directories that do not match,
//! or whose identity cannot be read, are skipped and never overwritten.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use avsrt_common::{read_json, write_json_atomic, AvsrtError, AvsrtResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::run_log::RunLog;

/// Identity record file inside every workspace.
pub const MEDIA_FILE: &str = "media.json";

/// Run log file inside every workspace.
pub const RUN_LOG_FILE: &str = "run.log";

/// Highest numbered suffix tried before giving up.
const MAX_SUFFIX: u32 = 999;

/// Cheap identity of a media file's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFingerprint {
    pub size_bytes: u64,
    /// Modification time in nanoseconds since the Unix epoch.
    pub mtime_ns: u64,
}

impl MediaFingerprint {
    pub fn of(path: &Path) -> AvsrtResult<Self> {
        let metadata = fs::metadata(path)?;
        let mtime_ns = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Ok(Self {
            size_bytes: metadata.len(),
            mtime_ns,
        })
    }
}

/// Contents of `media.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub input_path: String,
    pub file_name: String,
    pub work_dir: String,
    pub fingerprint: MediaFingerprint,
    pub created_at: DateTime<Utc>,
}

impl MediaRecord {
    fn matches(&self, input_path: &Path, fingerprint: &MediaFingerprint) -> bool {
        self.input_path == input_path.to_string_lossy() && self.fingerprint == *fingerprint
    }
}

/// A resolved workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    input_path: PathBuf,
    work_dir: PathBuf,
    media: MediaRecord,
    run_log: RunLog,
}

impl Workspace {
    /// Reuse the matching workspace for `media_path`, or claim the first
    /// free candidate directory.
    pub fn resolve(media_path: &Path) -> AvsrtResult<Self> {
        let (input_path, fingerprint) = identify(media_path)?;

        for suffix in 0..=MAX_SUFFIX {
            let candidate = candidate_dir(&input_path, suffix);
            if candidate.exists() {
                if let Some(media) = matching_record(&candidate, &input_path, &fingerprint) {
                    let workspace = Self::open(input_path, candidate, media);
                    workspace
                        .run_log
                        .append(format!("workspace: reuse {}", workspace.work_dir.display()))?;
                    tracing::debug!(work_dir = %workspace.work_dir.display(), "reusing workspace");
                    return Ok(workspace);
                }
                tracing::debug!(
                    candidate = %candidate.display(),
                    "workspace belongs to other media, skipping"
                );
                continue;
            }

            fs::create_dir_all(&candidate)?;
            let media = MediaRecord {
                input_path: input_path.to_string_lossy().into_owned(),
                file_name: input_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                work_dir: candidate.to_string_lossy().into_owned(),
                fingerprint,
                created_at: Utc::now(),
            };
            write_json_atomic(&candidate.join(MEDIA_FILE), &media)?;

            let workspace = Self::open(input_path, candidate, media);
            workspace
                .run_log
                .append(format!("workspace: init {}", workspace.work_dir.display()))?;
            tracing::info!(work_dir = %workspace.work_dir.display(), "created workspace");
            return Ok(workspace);
        }

        Err(AvsrtError::invalid_input(format!(
            "no free workspace directory for {}",
            input_path.display()
        )))
    }

    /// Locate the matching workspace for `media_path` without creating
    /// anything.
    pub fn find(media_path: &Path) -> AvsrtResult<Option<Self>> {
        let (input_path, fingerprint) = identify(media_path)?;
        for suffix in 0..=MAX_SUFFIX {
            let candidate = candidate_dir(&input_path, suffix);
            if !candidate.exists() {
                return Ok(None);
            }
            if let Some(media) = matching_record(&candidate, &input_path, &fingerprint) {
                return Ok(Some(Self::open(input_path, candidate, media)));
            }
        }
        Ok(None)
    }

    fn open(input_path: PathBuf, work_dir: PathBuf, media: MediaRecord) -> Self {
        let run_log = RunLog::new(work_dir.join(RUN_LOG_FILE));
        Self {
            input_path,
            work_dir,
            media,
            run_log,
        }
    }

    /// Absolute path of the media file.
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn media(&self) -> &MediaRecord {
        &self.media
    }

    pub fn run_log(&self) -> &RunLog {
        &self.run_log
    }

    /// Path of an artifact inside the workspace.
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Subtitle track next to the media file: `<stem>.<language>.srt`.
    pub fn subtitle_path(&self, language: &str) -> PathBuf {
        let parent = self.input_path.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!("{}.{language}.srt", media_stem(&self.input_path)))
    }
}

/// Canonical path and fingerprint of a media file.
fn identify(media_path: &Path) -> AvsrtResult<(PathBuf, MediaFingerprint)> {
    if !media_path.exists() {
        return Err(AvsrtError::NotFound {
            path: media_path.to_path_buf(),
        });
    }
    let input_path = fs::canonicalize(media_path)?;
    if !input_path.is_file() {
        return Err(AvsrtError::invalid_input(format!(
            "not a regular file: {}",
            input_path.display()
        )));
    }
    let fingerprint = MediaFingerprint::of(&input_path)?;
    Ok((input_path, fingerprint))
}

fn media_stem(input_path: &Path) -> String {
    input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn candidate_dir(input_path: &Path, suffix: u32) -> PathBuf {
    let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
    let base = format!("{}.avsrt", media_stem(input_path));
    if suffix == 0 {
        parent.join(base)
    } else {
        parent.join(format!("{base}.{suffix:03}"))
    }
}

fn matching_record(
    candidate: &Path,
    input_path: &Path,
    fingerprint: &MediaFingerprint,
) -> Option<MediaRecord> {
    let record: MediaRecord = read_json(&candidate.join(MEDIA_FILE)).ok()?;
    record.matches(input_path, fingerprint).then_some(record)
}
