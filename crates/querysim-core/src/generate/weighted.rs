use rand::Rng;

/// Weighted categorical sampler over a fixed item list.
///
/// Keeps the running prefix sums of the weights and draws with a single
/// uniform integer plus a binary search, so memory is O(k) regardless of
/// how large the weights are.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    items: Vec<T>,
    cumulative: Vec<u64>,
    total: u64,
}

impl<T> WeightedTable<T> {
    /// Build from `(item, weight)` pairs. Returns `None` when every weight
    /// is zero, since nothing could ever be drawn.
    pub fn new<I>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (T, u32)>,
    {
        let mut items = Vec::new();
        let mut cumulative = Vec::new();
        let mut total: u64 = 0;
        for (item, weight) in entries {
            total += u64::from(weight);
            items.push(item);
            cumulative.push(total);
        }
        if total == 0 {
            return None;
        }
        Some(Self {
            items,
            cumulative,
            total,
        })
    }

    /// Draw one item with probability proportional to its weight.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        let roll = rng.random_range(0..self.total);
        // First prefix strictly greater than the roll. Zero-weight items
        // share a prefix with their predecessor and are skipped.
        let idx = self.cumulative.partition_point(|&c| c <= roll);
        &self.items[idx]
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_all_zero_is_none() {
        assert!(WeightedTable::new(vec![("a", 0), ("b", 0)]).is_none());
        assert!(WeightedTable::<&str>::new(Vec::new()).is_none());
    }

    #[test]
    fn test_zero_weight_never_drawn() {
        let table = WeightedTable::new(vec![("a", 0), ("b", 3), ("c", 0), ("d", 1)]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10_000 {
            let v = *table.pick(&mut rng);
            assert!(v == "b" || v == "d");
        }
    }

    #[test]
    fn test_proportions() {
        let table = WeightedTable::new(vec![(1usize, 50), (2, 35), (3, 15)]).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let mut counts = [0usize; 4];
        let n = 100_000;
        for _ in 0..n {
            counts[*table.pick(&mut rng)] += 1;
        }
        let share = |i: usize| counts[i] as f64 / n as f64;
        assert!((share(1) - 0.50).abs() < 0.01);
        assert!((share(2) - 0.35).abs() < 0.01);
        assert!((share(3) - 0.15).abs() < 0.01);
    }

    #[test]
    fn test_single_item() {
        let table = WeightedTable::new(vec![("only", 7)]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(*table.pick(&mut rng), "only");
        assert_eq!(table.total(), 7);
        assert_eq!(table.len(), 1);
    }
}
