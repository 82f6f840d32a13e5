//! avsrt Pipeline
//!
//! Resumable subtitle generation over a per-media workspace:
//! - **Workspace:** Locate or claim the working directory for a media file
//! - **Cache:** Fingerprint-based stage caching with atomic commits
//! - **Stages:** Gate, block build, normalize, render, and the translation
//!   seam
//! - **Pipeline:** Run every stage in order and report what was reused
//!
//! Stages never share in-memory state; each one reads only the committed
//! artifacts of the stage before it.

pub mod cache;
pub mod pipeline;
pub mod run_log;
pub mod stages;
pub mod workspace;

pub use cache::{CacheKey, CacheLookup, MissReason, Sidecar};
pub use pipeline::{Pipeline, PipelineReport};
pub use run_log::RunLog;
pub use stages::{StageOutcome, StageProbe, StageStatus};
pub use workspace::{MediaFingerprint, MediaRecord, Workspace};
