//! # Configuration File Parser
//!
//! Reads and parses `querysim.toml`, the optional configuration file that
//! customizes a run without CLI flags. Supports:
//!
//! - `[generate]`: default query count, seed, shard count, subquery fallback
//! - `[simulate]`: slow-query threshold
//! - `[patterns]`: per-pattern weight overrides
//! - `[schema]`: a replacement table/column/join registry
//!
//! Example `querysim.toml`:
//!
//! ```toml
//! [generate]
//! num = 5000
//! seed = 42
//! subquery_fallback = "adjacent_only"
//!
//! [simulate]
//! slow_threshold_ms = 750.0
//!
//! [patterns]
//! select_join = 20
//! select_having = 0
//!
//! [schema]
//! tables = { users = ["id", "name", "age"], orders = ["id", "user_id", "total"] }
//! joins = [
//!   { child = "orders", child_column = "user_id", parent = "users", parent_column = "id" },
//! ]
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::warn;

use crate::error::{QuerySimError, Result};
use crate::generate::patterns::SubqueryFallback;
use crate::generate::query::Pattern;
use crate::schema::builtin::builtin_registry;
use crate::schema::types::{JoinEdge, SchemaRegistry};
use crate::simulate::DEFAULT_SLOW_THRESHOLD_MS;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "querysim.toml";

/// Query count used when neither the CLI nor the config sets one.
pub const DEFAULT_NUM_QUERIES: usize = 5000;

/// Top-level querysim.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuerySimConfig {
    pub generate: GenerateConfig,
    pub simulate: SimulateConfig,
    /// Weight overrides keyed by pattern name. Patterns not listed keep
    /// their built-in weight.
    pub patterns: IndexMap<String, u32>,
    pub schema: SchemaConfig,

    /// Absolute path to the directory containing querysim.toml.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Number of queries to generate.
    pub num: Option<usize>,
    /// Fixed random seed for reproducible output.
    pub seed: Option<u64>,
    /// Parallel shard count (1 = single stream).
    pub shards: Option<usize>,
    pub subquery_fallback: SubqueryFallback,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulateConfig {
    /// Queries strictly slower than this are labeled slow.
    pub slow_threshold_ms: f64,
}

impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            slow_threshold_ms: DEFAULT_SLOW_THRESHOLD_MS,
        }
    }
}

/// A replacement schema. Table order in the file is the order random
/// table picks index into, so reordering tables changes seeded output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub tables: IndexMap<String, Vec<String>>,
    pub joins: Vec<JoinEdge>,
}

/// Read and parse a querysim.toml file from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
/// Returns an error if the file exists but can't be parsed or validated.
pub fn read_config(dir: &Path) -> Result<Option<QuerySimConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    read_config_file(&path).map(Some)
}

/// Read and validate a config file at an explicit path.
pub fn read_config_file(path: &Path) -> Result<QuerySimConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| QuerySimError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let mut config: QuerySimConfig =
        toml::from_str(&content).map_err(|e| QuerySimError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

    let dir = path.parent().unwrap_or(Path::new("."));
    config.config_dir = Some(std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()));

    config.validate()?;

    Ok(config)
}

impl QuerySimConfig {
    /// Validate semantic constraints that serde cannot enforce.
    ///
    /// Runs right after parsing so a bad file fails before any round is
    /// generated.
    pub fn validate(&self) -> Result<()> {
        if self.generate.num == Some(0) {
            return Err(QuerySimError::Config {
                message: "[generate] num must be at least 1".to_string(),
            });
        }
        if self.generate.shards == Some(0) {
            return Err(QuerySimError::Config {
                message: "[generate] shards must be at least 1".to_string(),
            });
        }

        let threshold = self.simulate.slow_threshold_ms;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(QuerySimError::Config {
                message: format!(
                    "[simulate] slow_threshold_ms must be a positive number, got {}",
                    threshold
                ),
            });
        }

        let weights = self.pattern_weights()?;
        if weights.values().all(|w| *w == 0) {
            return Err(QuerySimError::EmptyPatternWeights);
        }
        if self.generate.subquery_fallback == SubqueryFallback::AdjacentOnly
            && weights.get(&Pattern::SelectSubquery).copied().unwrap_or(0) == 0
        {
            warn!("[generate] subquery_fallback is ignored: select_subquery has weight 0");
        }

        if self.schema.tables.is_empty() && !self.schema.joins.is_empty() {
            return Err(QuerySimError::Config {
                message: "[schema] joins were given without [schema] tables. \
                          Custom joins only apply to a custom table list."
                    .to_string(),
            });
        }
        if !self.schema.tables.is_empty() {
            self.registry()?;
        }

        Ok(())
    }

    /// The registry to generate against: the `[schema]` section when it
    /// lists tables, otherwise the built-in schema.
    pub fn registry(&self) -> Result<SchemaRegistry> {
        if self.schema.tables.is_empty() {
            return Ok(builtin_registry());
        }
        SchemaRegistry::new(
            self.schema
                .tables
                .iter()
                .map(|(name, cols)| (name.clone(), cols.clone())),
            self.schema.joins.clone(),
        )
    }

    /// Built-in weights with `[patterns]` overrides applied, in the
    /// canonical pattern order.
    pub fn pattern_weights(&self) -> Result<IndexMap<Pattern, u32>> {
        let mut weights: IndexMap<Pattern, u32> = Pattern::ALL
            .iter()
            .map(|p| (*p, p.default_weight()))
            .collect();
        for (name, weight) in &self.patterns {
            let pattern: Pattern = name.parse()?;
            weights.insert(pattern, *weight);
        }
        Ok(weights)
    }

    /// Whether the `[schema]` section replaces the built-in registry.
    pub fn has_custom_schema(&self) -> bool {
        !self.schema.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[generate]
num = 1200
seed = 42
shards = 4
subquery_fallback = "adjacent_only"

[simulate]
slow_threshold_ms = 750.0

[patterns]
select_join = 30
select_having = 0

[schema]
tables = { users = ["id", "name"], orders = ["id", "user_id"] }
joins = [{ child = "orders", child_column = "user_id", parent = "users", parent_column = "id" }]
"#;

        let config: QuerySimConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.generate.num, Some(1200));
        assert_eq!(config.generate.seed, Some(42));
        assert_eq!(config.generate.shards, Some(4));
        assert_eq!(
            config.generate.subquery_fallback,
            SubqueryFallback::AdjacentOnly
        );
        assert_eq!(config.simulate.slow_threshold_ms, 750.0);
        assert_eq!(config.patterns["select_join"], 30);
        assert!(config.validate().is_ok());

        let registry = config.registry().unwrap();
        assert_eq!(registry.table_names(), vec!["users", "orders"]);
        assert_eq!(registry.join_count(), 1);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: QuerySimConfig = toml::from_str("").unwrap();
        assert!(config.generate.num.is_none());
        assert_eq!(config.generate.subquery_fallback, SubqueryFallback::AnyEdge);
        assert_eq!(config.simulate.slow_threshold_ms, DEFAULT_SLOW_THRESHOLD_MS);
        assert!(config.patterns.is_empty());
        assert!(!config.has_custom_schema());
        assert_eq!(config.registry().unwrap().table_count(), 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pattern_overrides_keep_defaults() {
        let config: QuerySimConfig = toml::from_str(
            r#"
[patterns]
select_distinct = 40
"#,
        )
        .unwrap();
        let weights = config.pattern_weights().unwrap();
        assert_eq!(weights.len(), 10);
        assert_eq!(weights[&Pattern::SelectDistinct], 40);
        assert_eq!(weights[&Pattern::SelectWhere], 20);
        assert_eq!(*weights.keys().next().unwrap(), Pattern::SimpleSelect);
    }

    #[test]
    fn test_unknown_pattern_fails_validation() {
        let config: QuerySimConfig = toml::from_str(
            r#"
[patterns]
select_window = 5
"#,
        )
        .unwrap();
        let msg = format!("{}", config.validate().unwrap_err());
        assert!(msg.contains("select_window"), "{}", msg);
    }

    #[test]
    fn test_all_zero_weights_fail_validation() {
        let mut toml = String::from("[patterns]\n");
        for p in Pattern::ALL {
            toml.push_str(&format!("{} = 0\n", p));
        }
        let config: QuerySimConfig = toml::from_str(&toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(QuerySimError::EmptyPatternWeights)
        ));
    }

    #[test]
    fn test_bad_threshold_fails_validation() {
        let config: QuerySimConfig = toml::from_str(
            r#"
[simulate]
slow_threshold_ms = -3.0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_num_fails_validation() {
        let config: QuerySimConfig = toml::from_str("[generate]\nnum = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_joins_without_tables_fail_validation() {
        let config: QuerySimConfig = toml::from_str(
            r#"
[schema]
joins = [{ child = "orders", child_column = "user_id", parent = "users", parent_column = "id" }]
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_schema_join_to_missing_column_fails_validation() {
        let config: QuerySimConfig = toml::from_str(
            r#"
[schema]
tables = { users = ["id"], orders = ["id"] }
joins = [{ child = "orders", child_column = "user_id", parent = "users", parent_column = "id" }]
"#,
        )
        .unwrap();
        let msg = format!("{}", config.validate().unwrap_err());
        assert!(msg.contains("user_id"), "{}", msg);
    }

    #[test]
    fn test_read_config_nonexistent() {
        let result = read_config(Path::new("/nonexistent/dir"));
        assert!(result.is_ok());
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_read_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
[generate]
num = 200
seed = 7
"#,
        )
        .unwrap();

        let config = read_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.generate.num, Some(200));
        assert_eq!(config.generate.seed, Some(7));

        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(config.config_dir.as_deref(), Some(expected.as_path()));
    }

    #[test]
    fn test_read_config_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "this is not valid [[[toml",
        )
        .unwrap();
        assert!(read_config(dir.path()).is_err());
    }

    #[test]
    fn test_unknown_fallback_rejected_by_parser() {
        let result: std::result::Result<QuerySimConfig, _> =
            toml::from_str("[generate]\nsubquery_fallback = \"nearest\"\n");
        assert!(result.is_err());
    }
}
