use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::features::{FEATURE_COLUMNS, FEATURE_CONTRACT_VERSION};
use crate::generate::patterns::SubqueryFallback;
use crate::generate::query::Pattern;
use crate::schema::types::SchemaSnapshot;

/// The `querysim.manifest.json` written next to every dataset.
///
/// Records everything needed to regenerate the dataset byte-for-byte
/// (seed, count, shards, weights, threshold, schema) plus the dataset's own
/// SHA-256 so a consumer can tell whether the file was modified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// QuerySim version that generated the dataset.
    pub querysim_version: String,
    pub seed: u64,
    pub num_queries: usize,
    /// 1 for a single stream; otherwise the sharded generator was used.
    pub shards: usize,
    pub feature_contract: FeatureContract,
    pub pattern_weights: IndexMap<Pattern, u32>,
    pub slow_threshold_ms: f64,
    pub subquery_fallback: SubqueryFallback,
    /// SHA256 of the schema snapshot's canonical JSON.
    pub schema_hash: String,
    /// Full schema snapshot, so `check` can report table- and column-level
    /// drift instead of a bare hash mismatch.
    pub schema_snapshot: SchemaSnapshot,
    /// Dataset file name, relative to the manifest's directory.
    pub dataset_file: String,
    pub dataset_sha256: String,
    pub created_at: String,
}

/// The feature layout a dataset was written with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureContract {
    pub version: u32,
    pub columns: Vec<String>,
}

impl FeatureContract {
    /// The contract this build produces.
    pub fn current() -> Self {
        Self {
            version: FEATURE_CONTRACT_VERSION,
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Run parameters captured into a manifest.
#[derive(Debug, Clone)]
pub struct RunParameters {
    pub seed: u64,
    pub num_queries: usize,
    pub shards: usize,
    pub pattern_weights: IndexMap<Pattern, u32>,
    pub slow_threshold_ms: f64,
    pub subquery_fallback: SubqueryFallback,
}

impl RunManifest {
    pub fn new(
        params: RunParameters,
        schema_hash: String,
        schema_snapshot: SchemaSnapshot,
        dataset_file: String,
        dataset_sha256: String,
    ) -> Self {
        Self {
            querysim_version: env!("CARGO_PKG_VERSION").to_string(),
            seed: params.seed,
            num_queries: params.num_queries,
            shards: params.shards,
            feature_contract: FeatureContract::current(),
            pattern_weights: params.pattern_weights,
            slow_threshold_ms: params.slow_threshold_ms,
            subquery_fallback: params.subquery_fallback,
            schema_hash,
            schema_snapshot,
            dataset_file,
            dataset_sha256,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Parse `created_at` back into a timestamp.
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        chrono::DateTime::parse_from_rfc3339(&self.created_at).ok()
    }
}
