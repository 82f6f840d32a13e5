//! Stage cache protocol.
//!
//! Every stage owns one artifact and one metadata sidecar. The sidecar
//! records the stage identity, the configuration used, a fingerprint of
//! the upstream bytes plus that configuration, and the SHA-256 of the
//! artifact it describes. A stage may reuse its artifact only when all of
//! these still agree with what it is about to compute.
//!
//! Commits write both files to temporary siblings first, then remove the
//! old sidecar, move the artifact into place and finally move the new
//! sidecar into place. An interrupted commit therefore leaves either no
//! sidecar or a sidecar whose recorded hash disagrees with the artifact,
//! and both read as a miss on the next run.

use std::fmt;
use std::fs;
use std::path::Path;

use avsrt_common::{
    read_json, sha256_file, sha256_hex, sync_parent_dir, to_canonical_json, to_compact_json,
    write_tmp, AvsrtResult,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Metadata written next to a stage artifact.
pub trait Sidecar: Serialize + DeserializeOwned {
    fn stage(&self) -> &str;
    fn version(&self) -> u32;
    /// The configuration recorded at commit time, in the same shape as
    /// [`CacheKey::config`].
    fn config(&self) -> Value;
    fn input_fingerprint(&self) -> &str;
    /// SHA-256 of the artifact this sidecar describes.
    fn output_sha256(&self) -> &str;
}

/// What a stage is about to compute.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    pub stage: &'static str,
    pub version: u32,
    pub config: Value,
    pub input_fingerprint: String,
}

impl CacheKey {
    /// Key for `upstream` bytes processed under `config`.
    ///
    /// The fingerprint is `sha256(upstream || 0x00 || canonical config)`.
    pub fn new<C: Serialize + ?Sized>(
        stage: &'static str,
        version: u32,
        config: &C,
        upstream: &[u8],
    ) -> AvsrtResult<Self> {
        let config = serde_json::to_value(config)?;
        let mut payload = upstream.to_vec();
        payload.push(0);
        payload.extend_from_slice(&to_compact_json(&config)?);
        Ok(Self {
            stage,
            version,
            config,
            input_fingerprint: sha256_hex(&payload),
        })
    }
}

/// Why a cached artifact cannot be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    NoArtifact,
    NoMetadata,
    UnreadableMetadata,
    SchemaChanged,
    ConfigMismatch,
    InputChanged,
    /// The artifact no longer hashes to what its sidecar recorded.
    Inconsistent,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::NoArtifact => "no artifact",
            MissReason::NoMetadata => "no metadata",
            MissReason::UnreadableMetadata => "unreadable metadata",
            MissReason::SchemaChanged => "schema changed",
            MissReason::ConfigMismatch => "config mismatch",
            MissReason::InputChanged => "input changed",
            MissReason::Inconsistent => "inconsistent artifact",
        }
    }
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum CacheLookup<S> {
    Hit(S),
    Miss(MissReason),
}

impl<S> CacheLookup<S> {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

/// Decide whether `artifact` and its sidecar at `meta_path` are still
/// valid for `key`. Performs no writes.
pub fn lookup<S: Sidecar>(
    artifact: &Path,
    meta_path: &Path,
    key: &CacheKey,
) -> AvsrtResult<CacheLookup<S>> {
    if !artifact.exists() {
        return Ok(CacheLookup::Miss(MissReason::NoArtifact));
    }
    if !meta_path.exists() {
        return Ok(CacheLookup::Miss(MissReason::NoMetadata));
    }
    let meta: S = match read_json(meta_path) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::debug!(path = %meta_path.display(), error = %e, "unreadable sidecar");
            return Ok(CacheLookup::Miss(MissReason::UnreadableMetadata));
        }
    };

    if meta.stage() != key.stage || meta.version() != key.version {
        return Ok(CacheLookup::Miss(MissReason::SchemaChanged));
    }
    if meta.config() != key.config {
        return Ok(CacheLookup::Miss(MissReason::ConfigMismatch));
    }
    if meta.input_fingerprint() != key.input_fingerprint {
        return Ok(CacheLookup::Miss(MissReason::InputChanged));
    }
    match sha256_file(artifact) {
        Ok(digest) if digest == meta.output_sha256() => {}
        Ok(_) => return Ok(CacheLookup::Miss(MissReason::Inconsistent)),
        Err(e) => {
            tracing::debug!(path = %artifact.display(), error = %e, "unreadable artifact");
            return Ok(CacheLookup::Miss(MissReason::Inconsistent));
        }
    }

    Ok(CacheLookup::Hit(meta))
}

/// Commit `artifact_bytes` to `artifact` and `meta` to `meta_path`.
pub fn commit<S: Sidecar>(
    artifact: &Path,
    artifact_bytes: &[u8],
    meta_path: &Path,
    meta: &S,
) -> AvsrtResult<()> {
    let artifact_tmp = write_tmp(artifact, artifact_bytes)?;
    let meta_tmp = write_tmp(meta_path, &to_canonical_json(meta)?)?;

    if meta_path.exists() {
        fs::remove_file(meta_path)?;
    }
    fs::rename(&artifact_tmp, artifact)?;
    sync_parent_dir(artifact)?;
    fs::rename(&meta_tmp, meta_path)?;
    sync_parent_dir(meta_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct TestMeta {
        stage: String,
        version: u32,
        width: u32,
        input_fingerprint: String,
        out_sha256: String,
    }

    impl Sidecar for TestMeta {
        fn stage(&self) -> &str {
            &self.stage
        }
        fn version(&self) -> u32 {
            self.version
        }
        fn config(&self) -> Value {
            json!({ "width": self.width })
        }
        fn input_fingerprint(&self) -> &str {
            &self.input_fingerprint
        }
        fn output_sha256(&self) -> &str {
            &self.out_sha256
        }
    }

    fn meta_for(key: &CacheKey, bytes: &[u8]) -> TestMeta {
        TestMeta {
            stage: key.stage.to_string(),
            version: key.version,
            width: key.config["width"].as_u64().unwrap() as u32,
            input_fingerprint: key.input_fingerprint.clone(),
            out_sha256: sha256_hex(bytes),
        }
    }

    #[test]
    fn test_fingerprint_depends_on_input_and_config() {
        let a = CacheKey::new("t", 1, &json!({"width": 10}), b"abc").unwrap();
        let b = CacheKey::new("t", 1, &json!({"width": 10}), b"abc").unwrap();
        let c = CacheKey::new("t", 1, &json!({"width": 11}), b"abc").unwrap();
        let d = CacheKey::new("t", 1, &json!({"width": 10}), b"abd").unwrap();
        assert_eq!(a.input_fingerprint, b.input_fingerprint);
        assert_ne!(a.input_fingerprint, c.input_fingerprint);
        assert_ne!(a.input_fingerprint, d.input_fingerprint);
    }

    #[test]
    fn test_lookup_reasons() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("out.json");
        let meta_path = dir.path().join("out.meta.json");
        let key = CacheKey::new("t", 1, &json!({"width": 10}), b"abc").unwrap();

        let miss = |reason: MissReason| {
            let result = lookup::<TestMeta>(&artifact, &meta_path, &key).unwrap();
            assert!(matches!(result, CacheLookup::Miss(r) if r == reason));
        };

        miss(MissReason::NoArtifact);
        fs::write(&artifact, b"[]\n").unwrap();
        miss(MissReason::NoMetadata);
        fs::write(&meta_path, b"{not json").unwrap();
        miss(MissReason::UnreadableMetadata);

        commit(&artifact, b"[]\n", &meta_path, &meta_for(&key, b"[]\n")).unwrap();
        assert!(lookup::<TestMeta>(&artifact, &meta_path, &key).unwrap().is_hit());

        let other_version = CacheKey { version: 2, ..key.clone() };
        assert!(matches!(
            lookup::<TestMeta>(&artifact, &meta_path, &other_version).unwrap(),
            CacheLookup::Miss(MissReason::SchemaChanged)
        ));

        let wider = CacheKey::new("t", 1, &json!({"width": 11}), b"abc").unwrap();
        assert!(matches!(
            lookup::<TestMeta>(&artifact, &meta_path, &wider).unwrap(),
            CacheLookup::Miss(MissReason::ConfigMismatch)
        ));

        let changed = CacheKey::new("t", 1, &json!({"width": 10}), b"xyz").unwrap();
        assert!(matches!(
            lookup::<TestMeta>(&artifact, &meta_path, &changed).unwrap(),
            CacheLookup::Miss(MissReason::InputChanged)
        ));

        fs::write(&artifact, b"[1]\n").unwrap();
        miss(MissReason::Inconsistent);
    }

    #[test]
    fn test_unreadable_artifact_is_inconsistent() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("out.json");
        let meta_path = dir.path().join("out.meta.json");
        let key = CacheKey::new("t", 1, &json!({"width": 10}), b"abc").unwrap();
        commit(&artifact, b"[]\n", &meta_path, &meta_for(&key, b"[]\n")).unwrap();

        // A directory in the artifact's place exists but cannot be read.
        fs::remove_file(&artifact).unwrap();
        fs::create_dir(&artifact).unwrap();
        assert!(matches!(
            lookup::<TestMeta>(&artifact, &meta_path, &key).unwrap(),
            CacheLookup::Miss(MissReason::Inconsistent)
        ));
    }

    #[test]
    fn test_commit_replaces_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("out.json");
        let meta_path = dir.path().join("out.meta.json");
        let key = CacheKey::new("t", 1, &json!({"width": 10}), b"abc").unwrap();

        commit(&artifact, b"old\n", &meta_path, &meta_for(&key, b"old\n")).unwrap();
        commit(&artifact, b"new\n", &meta_path, &meta_for(&key, b"new\n")).unwrap();

        assert_eq!(fs::read(&artifact).unwrap(), b"new\n");
        assert!(lookup::<TestMeta>(&artifact, &meta_path, &key).unwrap().is_hit());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
