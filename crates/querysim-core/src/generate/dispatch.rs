use indexmap::IndexMap;
use rand::Rng;

use crate::error::{QuerySimError, Result};
use crate::generate::query::Pattern;
use crate::generate::weighted::WeightedTable;

/// Picks the pattern for each round in proportion to its configured weight.
#[derive(Debug, Clone)]
pub struct PatternDispatcher {
    table: WeightedTable<Pattern>,
    weights: IndexMap<Pattern, u32>,
}

impl PatternDispatcher {
    /// Build from typed weights. Errors if every weight is zero.
    pub fn new(weights: &IndexMap<Pattern, u32>) -> Result<Self> {
        let table = WeightedTable::new(weights.iter().map(|(p, w)| (*p, *w)))
            .ok_or(QuerySimError::EmptyPatternWeights)?;
        Ok(Self {
            table,
            weights: weights.clone(),
        })
    }

    /// Build from pattern names as they appear in configuration. Any name
    /// that is not one of the ten patterns is rejected.
    pub fn from_names(weights: &IndexMap<String, u32>) -> Result<Self> {
        let mut typed = IndexMap::with_capacity(weights.len());
        for (name, weight) in weights {
            typed.insert(name.parse::<Pattern>()?, *weight);
        }
        Self::new(&typed)
    }

    /// Dispatcher over the built-in weights.
    pub fn default_weights() -> Self {
        let weights: IndexMap<Pattern, u32> = Pattern::ALL
            .iter()
            .map(|p| (*p, p.default_weight()))
            .collect();
        let table = WeightedTable::new(weights.iter().map(|(p, w)| (*p, *w)))
            .expect("built-in pattern weights are non-zero");
        Self { table, weights }
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Pattern {
        *self.table.pick(rng)
    }

    pub fn weights(&self) -> &IndexMap<Pattern, u32> {
        &self.weights
    }

    /// Weight of `pattern`, zero when it is not configured.
    pub fn weight(&self, pattern: Pattern) -> u32 {
        self.weights.get(&pattern).copied().unwrap_or(0)
    }

    pub fn total_weight(&self) -> u64 {
        self.table.total()
    }
}
