//! Canonical JSON artifacts, content hashing and atomic file writes.
//!
//! Every JSON artifact is written the same way: object keys sorted,
//! two-space indentation, UTF-8 with non-ASCII characters left unescaped,
//! and a single trailing newline. Identical values therefore always
//! produce identical bytes, which is what the stage fingerprints hash.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AvsrtResult;

/// Serialize `value` to canonical JSON bytes.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> AvsrtResult<Vec<u8>> {
    // Round-tripping through `Value` sorts object keys.
    let value = serde_json::to_value(value)?;
    let mut bytes = serde_json::to_vec_pretty(&value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Compact canonical JSON, used inside fingerprints.
pub fn to_compact_json<T: Serialize + ?Sized>(value: &T) -> AvsrtResult<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&value)?)
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> AvsrtResult<T> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Write `value` as canonical JSON through a temporary sibling.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> AvsrtResult<()> {
    atomic_write_bytes(path, &to_canonical_json(value)?)
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Lowercase hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> AvsrtResult<String> {
    let bytes = fs::read(path)?;
    Ok(sha256_hex(&bytes))
}

/// Temporary sibling used while `path` is being replaced.
pub fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to the temporary sibling of `path`, flushed to disk, and
/// return the temporary path. The caller renames it into place.
pub fn write_tmp(path: &Path, bytes: &[u8]) -> AvsrtResult<PathBuf> {
    let tmp = tmp_sibling(path);
    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()?;
    Ok(tmp)
}

/// Replace `path` with `bytes` so readers see either the old or the new
/// contents, never a partial file.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> AvsrtResult<()> {
    let tmp = write_tmp(path, bytes)?;
    fs::rename(&tmp, path)?;
    sync_parent_dir(path)?;
    Ok(())
}

/// Flush the directory entry of `path` on platforms that support it.
pub fn sync_parent_dir(path: &Path) -> AvsrtResult<()> {
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let dir = fs::File::open(parent)?;
            dir.sync_all()?;
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_keys_and_keeps_unicode() {
        let value = json!({"b": 1, "a": {"z": "字幕", "y": [1, 2]}});
        let bytes = to_canonical_json(&value).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "{\n  \"a\": {\n    \"y\": [\n      1,\n      2\n    ],\n    \"z\": \"字幕\"\n  },\n  \"b\": 1\n}\n"
        );
    }

    #[test]
    fn test_struct_fields_are_sorted() {
        #[derive(Serialize)]
        struct Meta {
            stage: &'static str,
            blocks_sha256: &'static str,
        }
        let text = String::from_utf8(
            to_canonical_json(&Meta {
                stage: "gate",
                blocks_sha256: "00",
            })
            .unwrap(),
        )
        .unwrap();
        assert!(text.find("blocks_sha256").unwrap() < text.find("stage").unwrap());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_atomic_write_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subtitle_blocks.meta.json");
        write_json_atomic(&path, &json!({"stage": "block-build"})).unwrap();
        assert!(!tmp_sibling(&path).exists());

        let back: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(back["stage"], "block-build");
        assert_eq!(sha256_file(&path).unwrap(), sha256_hex(&fs::read(&path).unwrap()));
    }

    #[test]
    fn test_tmp_sibling_keeps_full_name() {
        let tmp = tmp_sibling(Path::new("/w/segments.gated.meta.json"));
        assert_eq!(tmp, Path::new("/w/segments.gated.meta.json.tmp"));
    }
}
