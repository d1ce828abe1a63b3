use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::manifest::types::{FeatureContract, RunManifest};
use crate::manifest::{compute_schema_hash, sha256_file};
use crate::schema::types::{JoinEdge, SchemaRegistry, SchemaSnapshot};

/// Result of comparing a manifest against the schema a rerun would use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriftReport {
    pub has_drift: bool,
    pub new_tables: Vec<String>,
    pub removed_tables: Vec<String>,
    pub new_columns: Vec<ColumnRef>,
    pub removed_columns: Vec<ColumnRef>,
    /// Tables whose column set is unchanged but whose order moved. Column
    /// order feeds the random picks, so this alone breaks reproducibility.
    pub reordered_tables: Vec<String>,
    pub new_joins: Vec<JoinEdge>,
    pub removed_joins: Vec<JoinEdge>,
    pub contract_changed: bool,
}

impl DriftReport {
    /// Human-readable summary for terminal output.
    pub fn summary(&self) -> String {
        if !self.has_drift {
            return "No schema drift detected.".to_string();
        }

        let mut lines = vec!["Schema drift detected:".to_string()];

        for t in &self.new_tables {
            lines.push(format!("  + table: {}", t));
        }
        for t in &self.removed_tables {
            lines.push(format!("  - table: {}", t));
        }
        for c in &self.new_columns {
            lines.push(format!("  + column: {}.{}", c.table, c.column));
        }
        for c in &self.removed_columns {
            lines.push(format!("  - column: {}.{}", c.table, c.column));
        }
        for t in &self.reordered_tables {
            lines.push(format!("  ~ {}: column order changed", t));
        }
        for j in &self.new_joins {
            lines.push(format!("  + join: {}", j));
        }
        for j in &self.removed_joins {
            lines.push(format!("  - join: {}", j));
        }
        if self.contract_changed {
            lines.push("  ~ feature contract changed".to_string());
        }

        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

/// Compare the manifest's stored snapshot against the current registry.
///
/// Hash comparison is the fast path; on mismatch the full snapshot diff
/// produces table, column and join level detail.
pub fn check_drift(manifest: &RunManifest, current: &SchemaRegistry) -> Result<DriftReport> {
    let contract_changed = manifest.feature_contract != FeatureContract::current();
    let snapshot = current.snapshot();

    if compute_schema_hash(&snapshot)? == manifest.schema_hash {
        return Ok(DriftReport {
            has_drift: contract_changed,
            contract_changed,
            ..DriftReport::default()
        });
    }

    let mut report = check_drift_detailed(&manifest.schema_snapshot, &snapshot);
    report.contract_changed = contract_changed;
    report.has_drift |= contract_changed;
    Ok(report)
}

/// Diff two snapshots. `old` is the one captured in the manifest.
pub fn check_drift_detailed(old: &SchemaSnapshot, current: &SchemaSnapshot) -> DriftReport {
    let mut report = DriftReport::default();

    for name in current.tables.keys() {
        if !old.tables.contains_key(name) {
            report.new_tables.push(name.clone());
        }
    }
    for name in old.tables.keys() {
        if !current.tables.contains_key(name) {
            report.removed_tables.push(name.clone());
        }
    }

    for (table, current_cols) in &current.tables {
        let Some(old_cols) = old.tables.get(table) else {
            continue;
        };

        for col in current_cols {
            if !old_cols.contains(col) {
                report.new_columns.push(ColumnRef {
                    table: table.clone(),
                    column: col.clone(),
                });
            }
        }
        for col in old_cols {
            if !current_cols.contains(col) {
                report.removed_columns.push(ColumnRef {
                    table: table.clone(),
                    column: col.clone(),
                });
            }
        }

        let same_set = old_cols.len() == current_cols.len()
            && old_cols.iter().all(|c| current_cols.contains(c));
        if same_set && old_cols != current_cols {
            report.reordered_tables.push(table.clone());
        }
    }

    // Table order is also a reproducibility input.
    let shared_old: Vec<&String> = old
        .tables
        .keys()
        .filter(|t| current.tables.contains_key(*t))
        .collect();
    let shared_current: Vec<&String> = current
        .tables
        .keys()
        .filter(|t| old.tables.contains_key(*t))
        .collect();
    let table_order_changed = shared_old != shared_current;

    for edge in &current.joins {
        if !old.joins.contains(edge) {
            report.new_joins.push(edge.clone());
        }
    }
    for edge in &old.joins {
        if !current.joins.contains(edge) {
            report.removed_joins.push(edge.clone());
        }
    }

    report.has_drift = table_order_changed
        || old.joins != current.joins
        || !report.new_tables.is_empty()
        || !report.removed_tables.is_empty()
        || !report.new_columns.is_empty()
        || !report.removed_columns.is_empty()
        || !report.reordered_tables.is_empty();

    report
}

/// Outcome of re-hashing a dataset file against its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetIntegrity {
    Intact,
    Modified { expected: String, actual: String },
    Missing,
}

/// Re-hash the dataset a manifest points at. `dir` is the manifest's directory.
pub fn verify_dataset(manifest: &RunManifest, dir: &Path) -> Result<DatasetIntegrity> {
    let path = dir.join(&manifest.dataset_file);
    if !path.exists() {
        return Ok(DatasetIntegrity::Missing);
    }
    let actual = sha256_file(&path)?;
    if actual == manifest.dataset_sha256 {
        Ok(DatasetIntegrity::Intact)
    } else {
        Ok(DatasetIntegrity::Modified {
            expected: manifest.dataset_sha256.clone(),
            actual,
        })
    }
}
