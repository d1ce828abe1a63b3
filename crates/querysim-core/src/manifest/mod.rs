//! # Run Manifest
//!
//! `querysim.manifest.json` sits next to a generated dataset and records the
//! seed, counts, pattern weights, feature contract and a full schema
//! snapshot, so the dataset can be regenerated and audited later with
//! `querysim check`.
//!
//! The manifest is machine-written. Regenerate it rather than editing it.

pub mod types;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use self::types::RunManifest;
use crate::error::{QuerySimError, Result};
use crate::schema::types::SchemaSnapshot;

/// Default manifest file name.
pub const MANIFEST_FILE_NAME: &str = "querysim.manifest.json";

/// The manifest path that belongs to a dataset: same directory, fixed name.
pub fn manifest_path_for(dataset: &Path) -> PathBuf {
    dataset
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .join(MANIFEST_FILE_NAME)
}

/// SHA-256 of the snapshot's canonical JSON, hex encoded.
pub fn compute_schema_hash(snapshot: &SchemaSnapshot) -> Result<String> {
    let json = serde_json::to_vec(snapshot).map_err(|e| QuerySimError::Manifest {
        message: format!("Failed to serialize schema snapshot: {}", e),
    })?;
    Ok(hex(&Sha256::digest(&json)))
}

/// SHA-256 of a file's contents, hex encoded.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path).map_err(|e| QuerySimError::Output {
        message: format!("Failed to open {}", path.display()),
        source: e,
    })?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| QuerySimError::Output {
            message: format!("Failed to read {}", path.display()),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex(&hasher.finalize()))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// A writer that hashes every byte it forwards, so the dataset digest is
/// computed in the same pass that writes the file.
pub struct HashingWriter<W: Write> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    /// Hex digest of everything written so far, plus the inner writer.
    pub fn finish(self) -> (W, String) {
        (self.inner, hex(&self.hasher.finalize()))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Write a manifest to disk atomically.
///
/// Writes to a temporary file in the same directory, then renames it into
/// place, so an interrupted run never leaves a half-written manifest.
pub fn write_manifest(manifest: &RunManifest, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest).map_err(|e| QuerySimError::Manifest {
        message: format!("Failed to serialize manifest: {}", e),
    })?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let tmp_path = dir.join(".querysim.manifest.json.tmp");

    let mut file = fs::File::create(&tmp_path).map_err(|e| QuerySimError::Output {
        message: format!("Failed to create temp manifest at {}", tmp_path.display()),
        source: e,
    })?;
    file.write_all(json.as_bytes())
        .map_err(|e| QuerySimError::Output {
            message: format!("Failed to write temp manifest at {}", tmp_path.display()),
            source: e,
        })?;
    file.sync_all().map_err(|e| QuerySimError::Output {
        message: "Failed to sync manifest to disk".to_string(),
        source: e,
    })?;

    fs::rename(&tmp_path, path).map_err(|e| QuerySimError::Output {
        message: format!(
            "Failed to rename {} → {}",
            tmp_path.display(),
            path.display()
        ),
        source: e,
    })?;

    Ok(())
}

/// Read a manifest from disk.
pub fn read_manifest(path: &Path) -> Result<RunManifest> {
    let content = fs::read_to_string(path).map_err(|e| QuerySimError::Output {
        message: format!("Failed to read manifest from {}", path.display()),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| QuerySimError::Manifest {
        message: format!("Failed to parse manifest: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::dispatch::PatternDispatcher;
    use crate::generate::patterns::SubqueryFallback;
    use crate::manifest::types::{FeatureContract, RunParameters};
    use crate::schema::builtin::builtin_registry;
    use tempfile::tempdir;

    fn make_manifest() -> RunManifest {
        let snapshot = builtin_registry().snapshot();
        let hash = compute_schema_hash(&snapshot).unwrap();
        RunManifest::new(
            RunParameters {
                seed: 42,
                num_queries: 100,
                shards: 1,
                pattern_weights: PatternDispatcher::default_weights().weights().clone(),
                slow_threshold_ms: 500.0,
                subquery_fallback: SubqueryFallback::AnyEdge,
            },
            hash,
            snapshot,
            "dataset.csv".to_string(),
            "00".repeat(32),
        )
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);

        let manifest = make_manifest();
        write_manifest(&manifest, &path).unwrap();
        let loaded = read_manifest(&path).unwrap();

        assert_eq!(loaded.seed, 42);
        assert_eq!(loaded.num_queries, 100);
        assert_eq!(loaded.schema_hash, manifest.schema_hash);
        assert_eq!(loaded.pattern_weights, manifest.pattern_weights);
        assert_eq!(loaded.feature_contract, FeatureContract::current());
        assert!(loaded.created_at().is_some());
        assert!(!dir.path().join(".querysim.manifest.json.tmp").exists());
    }

    #[test]
    fn test_schema_hash_is_stable() {
        let a = compute_schema_hash(&builtin_registry().snapshot()).unwrap();
        let b = compute_schema_hash(&builtin_registry().snapshot()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hashing_writer_matches_file_hash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let file = fs::File::create(&path).unwrap();
        let mut writer = HashingWriter::new(file);
        writer.write_all(b"sql,pattern\nSELECT 1;,x\n").unwrap();
        let (_, digest) = writer.finish();
        assert_eq!(digest, sha256_file(&path).unwrap());
    }

    #[test]
    fn test_manifest_path_for() {
        assert_eq!(
            manifest_path_for(Path::new("out/data.csv")),
            Path::new("out").join(MANIFEST_FILE_NAME)
        );
        assert_eq!(
            manifest_path_for(Path::new("data.csv")),
            Path::new(".").join(MANIFEST_FILE_NAME)
        );
    }

    #[test]
    fn test_read_nonexistent_file() {
        assert!(read_manifest(Path::new("/nonexistent/querysim.manifest.json")).is_err());
    }
}
