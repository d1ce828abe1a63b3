//! Aggregate statistics over a generated dataset, for the end-of-run report.

use indexmap::IndexMap;
use serde::Serialize;

use crate::features::FEATURE_COLUMNS;
use crate::generate::engine::DatasetRecord;
use crate::generate::query::Pattern;

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub total: usize,
    pub slow: usize,
    /// Fraction of records labeled slow, in [0, 1].
    pub slow_share: f64,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub max_ms: f64,
    pub min_ms: f64,
    /// Record count per pattern, most frequent first.
    pub patterns: IndexMap<Pattern, usize>,
    /// Per-feature statistics in contract order.
    pub features: Vec<FeatureStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureStats {
    pub name: &'static str,
    pub mean: f64,
    pub min: u32,
    pub max: u32,
}

impl DatasetSummary {
    /// Summarize `records`. `None` for an empty dataset.
    pub fn from_records(records: &[DatasetRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let total = records.len();
        let n = total as f64;

        let slow = records.iter().filter(|r| r.is_slow == 1).count();

        let mut times: Vec<f64> = records.iter().map(|r| r.execution_time_ms).collect();
        times.sort_by(f64::total_cmp);
        let mean_ms = times.iter().sum::<f64>() / n;
        let median_ms = if total % 2 == 1 {
            times[total / 2]
        } else {
            (times[total / 2 - 1] + times[total / 2]) / 2.0
        };

        let mut patterns: IndexMap<Pattern, usize> = IndexMap::new();
        for r in records {
            *patterns.entry(r.pattern).or_default() += 1;
        }
        patterns.sort_by(|pa, ca, pb, cb| cb.cmp(ca).then(pa.cmp(pb)));

        let mut sums = [0u64; 14];
        let mut mins = [u32::MAX; 14];
        let mut maxs = [0u32; 14];
        for r in records {
            for (i, v) in r.features.to_array().into_iter().enumerate() {
                sums[i] += u64::from(v);
                mins[i] = mins[i].min(v);
                maxs[i] = maxs[i].max(v);
            }
        }
        let features = FEATURE_COLUMNS
            .into_iter()
            .enumerate()
            .map(|(i, name)| FeatureStats {
                name,
                mean: sums[i] as f64 / n,
                min: mins[i],
                max: maxs[i],
            })
            .collect();

        Some(Self {
            total,
            slow,
            slow_share: slow as f64 / n,
            mean_ms,
            median_ms,
            max_ms: times[total - 1],
            min_ms: times[0],
            patterns,
            features,
        })
    }

    /// Share of records with the given pattern, in [0, 1].
    pub fn pattern_share(&self, pattern: Pattern) -> f64 {
        self.patterns.get(&pattern).copied().unwrap_or(0) as f64 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;

    fn record(pattern: Pattern, ms: f64, tables: u32) -> DatasetRecord {
        DatasetRecord {
            sql: "SELECT id FROM users;".to_string(),
            pattern,
            features: FeatureVector {
                num_tables: tables,
                query_length: 21,
                ..FeatureVector::default()
            },
            execution_time_ms: ms,
            is_slow: u8::from(ms > 500.0),
        }
    }

    #[test]
    fn test_empty_is_none() {
        assert!(DatasetSummary::from_records(&[]).is_none());
    }

    #[test]
    fn test_basic_stats() {
        let records = vec![
            record(Pattern::SimpleSelect, 10.0, 1),
            record(Pattern::SelectJoin, 600.0, 2),
            record(Pattern::SimpleSelect, 20.0, 1),
            record(Pattern::SelectJoin, 900.0, 2),
        ];
        let s = DatasetSummary::from_records(&records).unwrap();
        assert_eq!(s.total, 4);
        assert_eq!(s.slow, 2);
        assert_eq!(s.slow_share, 0.5);
        assert_eq!(s.min_ms, 10.0);
        assert_eq!(s.max_ms, 900.0);
        assert_eq!(s.median_ms, 310.0);
        assert_eq!(s.mean_ms, 382.5);
        assert_eq!(s.pattern_share(Pattern::SelectJoin), 0.5);
        assert_eq!(s.pattern_share(Pattern::SelectHaving), 0.0);

        let tables = &s.features[0];
        assert_eq!(tables.name, "num_tables");
        assert_eq!(tables.mean, 1.5);
        assert_eq!((tables.min, tables.max), (1, 2));
    }

    #[test]
    fn test_patterns_sorted_by_count() {
        let records = vec![
            record(Pattern::SelectDistinct, 5.0, 1),
            record(Pattern::SelectWhere, 5.0, 1),
            record(Pattern::SelectWhere, 5.0, 1),
        ];
        let s = DatasetSummary::from_records(&records).unwrap();
        let order: Vec<Pattern> = s.patterns.keys().copied().collect();
        assert_eq!(order, vec![Pattern::SelectWhere, Pattern::SelectDistinct]);
    }
}
