use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::QuerySimConfig;
use crate::error::{QuerySimError, Result};
use crate::features::{extract_features, FeatureVector};
use crate::generate::dispatch::PatternDispatcher;
use crate::generate::patterns::{generate_pattern, PatternContext, SubqueryFallback};
use crate::generate::query::{Pattern, QueryMetadata};
use crate::graph::join_graph::JoinGraph;
use crate::schema::builtin::builtin_registry;
use crate::schema::types::SchemaRegistry;
use crate::simulate::CostModel;

/// Progress reporting batch size, so the terminal isn't redrawn every round.
const PROGRESS_BATCH_SIZE: usize = 100;

/// One labeled training row.
///
/// Serializes flat, in the column order consumers expect: `sql`, `pattern`,
/// the 14 feature fields, `execution_time_ms`, `is_slow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub sql: String,
    pub pattern: Pattern,
    #[serde(flatten)]
    pub features: FeatureVector,
    pub execution_time_ms: f64,
    pub is_slow: u8,
}

/// Drives rounds of dispatch → generate → extract → simulate.
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    registry: SchemaRegistry,
    dispatcher: PatternDispatcher,
    cost_model: CostModel,
    subquery_fallback: SubqueryFallback,
}

impl WorkloadGenerator {
    /// Assemble a generator, rejecting combinations that could fail mid-run:
    /// a join-driven pattern with positive weight over a schema without joins.
    pub fn new(
        registry: SchemaRegistry,
        dispatcher: PatternDispatcher,
        cost_model: CostModel,
        subquery_fallback: SubqueryFallback,
    ) -> Result<Self> {
        if registry.join_count() == 0 {
            if let Some(p) = Pattern::ALL
                .iter()
                .find(|p| p.requires_joins() && dispatcher.weight(**p) > 0)
            {
                return Err(QuerySimError::Config {
                    message: format!(
                        "pattern '{}' has weight {} but the schema defines no joins; \
                         set its weight to 0 or add [schema] joins",
                        p,
                        dispatcher.weight(*p)
                    ),
                });
            }
        }

        if dispatcher.weight(Pattern::SelectSubquery) > 0
            && subquery_fallback == SubqueryFallback::AnyEdge
        {
            let graph = JoinGraph::from_registry(&registry);
            let isolated = graph.isolated_tables();
            if !isolated.is_empty() {
                warn!(
                    "Tables without join edges will yield uncorrelated subqueries: {}",
                    isolated.join(", ")
                );
            }
        }

        Ok(Self {
            registry,
            dispatcher,
            cost_model,
            subquery_fallback,
        })
    }

    /// Built-in schema, built-in weights, default threshold.
    pub fn with_defaults() -> Self {
        Self {
            registry: builtin_registry(),
            dispatcher: PatternDispatcher::default_weights(),
            cost_model: CostModel::default(),
            subquery_fallback: SubqueryFallback::default(),
        }
    }

    pub fn from_config(config: &QuerySimConfig) -> Result<Self> {
        let registry = config.registry()?;
        let dispatcher = PatternDispatcher::new(&config.pattern_weights()?)?;
        Self::new(
            registry,
            dispatcher,
            CostModel::new(config.simulate.slow_threshold_ms),
            config.generate.subquery_fallback,
        )
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &PatternDispatcher {
        &self.dispatcher
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    pub fn subquery_fallback(&self) -> SubqueryFallback {
        self.subquery_fallback
    }

    fn context(&self) -> PatternContext<'_> {
        PatternContext::new(&self.registry).with_subquery_fallback(self.subquery_fallback)
    }

    /// Generate `num` records on a single stream. A seed makes the sequence
    /// reproducible; without one the stream is seeded from the OS.
    pub fn generate(
        &self,
        num: usize,
        seed: Option<u64>,
        progress_callback: Option<&dyn Fn(usize, usize)>,
    ) -> Result<Vec<DatasetRecord>> {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        info!(num, ?seed, "generating workload");
        let records = self.generate_with_rng(num, &mut rng, progress_callback)?;
        log_pattern_counts(&records);
        info!(num = records.len(), "workload generated");
        Ok(records)
    }

    /// Generate `num` records from a caller-owned stream.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        num: usize,
        rng: &mut R,
        progress_callback: Option<&dyn Fn(usize, usize)>,
    ) -> Result<Vec<DatasetRecord>> {
        let ctx = self.context();
        let mut records = Vec::with_capacity(num);
        for i in 0..num {
            let pattern = self.dispatcher.pick(rng);
            records.push(self.record(pattern, &ctx, rng)?);

            if let Some(cb) = progress_callback {
                let done = i + 1;
                if done.is_multiple_of(PROGRESS_BATCH_SIZE) || done == num {
                    cb(done, num);
                }
            }
        }
        Ok(records)
    }

    /// One dispatched record.
    pub fn generate_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DatasetRecord> {
        let pattern = self.dispatcher.pick(rng);
        self.record(pattern, &self.context(), rng)
    }

    /// One record of a fixed pattern, bypassing the dispatcher.
    pub fn generate_forced<R: Rng + ?Sized>(
        &self,
        pattern: Pattern,
        rng: &mut R,
    ) -> Result<DatasetRecord> {
        self.record(pattern, &self.context(), rng)
    }

    /// Statement metadata for a fixed pattern, without simulating it.
    pub fn compose<R: Rng + ?Sized>(&self, pattern: Pattern, rng: &mut R) -> Result<QueryMetadata> {
        generate_pattern(pattern, &self.context(), rng)
    }

    fn record<R: Rng + ?Sized>(
        &self,
        pattern: Pattern,
        ctx: &PatternContext<'_>,
        rng: &mut R,
    ) -> Result<DatasetRecord> {
        let meta = generate_pattern(pattern, ctx, rng)?;
        let features = extract_features(&meta);
        let (execution_time_ms, is_slow) = self.cost_model.evaluate(&features, pattern, rng);
        Ok(DatasetRecord {
            sql: meta.sql,
            pattern,
            features,
            execution_time_ms,
            is_slow,
        })
    }

    /// Generate `num` records split over `shards` independent streams run
    /// in parallel. Shard `i` is seeded with `shard_seed(seed, i)` and the
    /// shards are concatenated in index order, so output depends only on
    /// `(num, seed, shards)`, not on scheduling.
    pub fn generate_sharded(
        &self,
        num: usize,
        seed: u64,
        shards: usize,
        progress_callback: Option<&(dyn Fn(usize, usize) + Sync)>,
    ) -> Result<Vec<DatasetRecord>> {
        if shards == 0 {
            return Err(QuerySimError::Config {
                message: "shard count must be at least 1".to_string(),
            });
        }
        info!(num, seed, shards, "generating sharded workload");

        let done = AtomicUsize::new(0);
        let parts: Vec<Vec<DatasetRecord>> = shard_sizes(num, shards)
            .into_par_iter()
            .enumerate()
            .map(|(i, size)| -> Result<Vec<DatasetRecord>> {
                let mut rng = StdRng::seed_from_u64(shard_seed(seed, i));
                let ctx = self.context();
                let mut out = Vec::with_capacity(size);
                for _ in 0..size {
                    let pattern = self.dispatcher.pick(&mut rng);
                    out.push(self.record(pattern, &ctx, &mut rng)?);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(cb) = progress_callback {
                        if n.is_multiple_of(PROGRESS_BATCH_SIZE) || n == num {
                            cb(n, num);
                        }
                    }
                }
                Ok(out)
            })
            .collect::<Result<_>>()?;

        let records: Vec<DatasetRecord> = parts.into_iter().flatten().collect();
        log_pattern_counts(&records);
        Ok(records)
    }
}

/// Derive an independent stream seed for shard `shard` (SplitMix64 finalizer
/// over the run seed offset by the shard index).
pub fn shard_seed(seed: u64, shard: usize) -> u64 {
    let mut z = seed.wrapping_add((shard as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Contiguous shard sizes; the first `num % shards` shards take one extra.
pub fn shard_sizes(num: usize, shards: usize) -> Vec<usize> {
    let shards = shards.max(1);
    let base = num / shards;
    let extra = num % shards;
    (0..shards).map(|i| base + usize::from(i < extra)).collect()
}

fn log_pattern_counts(records: &[DatasetRecord]) {
    let mut counts: IndexMap<Pattern, usize> = IndexMap::new();
    for r in records {
        *counts.entry(r.pattern).or_default() += 1;
    }
    counts.sort_by(|_, a, _, b| b.cmp(a));
    for (pattern, count) in &counts {
        debug!(%pattern, count, "pattern dispatch count");
    }
}
