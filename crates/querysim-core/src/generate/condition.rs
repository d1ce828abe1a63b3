use std::sync::LazyLock;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::generate::value::random_literal;
use crate::generate::weighted::WeightedTable;
use crate::schema::types::SchemaRegistry;

const OPERATORS: &[&str] = &["=", ">", "<", ">=", "<=", "!="];

/// Predicate count when the caller leaves it open: 1, 2 or 3 at 50/35/15.
static PREDICATE_COUNTS: LazyLock<WeightedTable<usize>> = LazyLock::new(|| {
    WeightedTable::new([(1, 50), (2, 35), (3, 15)]).expect("predicate count weights are non-zero")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn as_sql(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// A WHERE clause body (without the `WHERE` keyword) and the columns it
/// filters on.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub clause: String,
    /// Distinct, in predicate order. Its length is the predicate count.
    pub columns: Vec<String>,
    pub connective: Connective,
}

/// Build a conjunction or disjunction of `table.column op literal`
/// predicates over distinct columns of `table`.
///
/// `count` is capped at the table's column count.
pub fn where_condition<R: Rng + ?Sized>(
    registry: &SchemaRegistry,
    table: &str,
    count: Option<usize>,
    rng: &mut R,
) -> Condition {
    let columns = registry.columns(table);
    let wanted = match count {
        Some(n) => n,
        None => *PREDICATE_COUNTS.pick(rng),
    };
    let chosen: Vec<String> = columns
        .choose_multiple(rng, wanted.min(columns.len()))
        .cloned()
        .collect();

    let mut parts = Vec::with_capacity(chosen.len());
    for col in &chosen {
        let op = OPERATORS[rng.random_range(0..OPERATORS.len())];
        let literal = random_literal(col, rng);
        parts.push(format!("{}.{} {} {}", table, col, op, literal));
    }

    let connective = if rng.random_bool(0.75) {
        Connective::And
    } else {
        Connective::Or
    };
    let clause = parts.join(&format!(" {} ", connective.as_sql()));

    Condition {
        clause,
        columns: chosen,
        connective,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builtin::builtin_registry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_explicit_count_is_honored() {
        let registry = builtin_registry();
        let mut rng = StdRng::seed_from_u64(3);
        for n in 1..=3 {
            let cond = where_condition(&registry, "orders", Some(n), &mut rng);
            assert_eq!(cond.columns.len(), n);
            assert_eq!(cond.clause.matches("orders.").count(), n);
        }
    }

    #[test]
    fn test_count_capped_at_column_count() {
        let registry = builtin_registry();
        let mut rng = StdRng::seed_from_u64(3);
        let total = registry.columns("categories").len();
        let cond = where_condition(&registry, "categories", Some(total + 5), &mut rng);
        assert_eq!(cond.columns.len(), total);
    }

    #[test]
    fn test_columns_are_distinct_and_registered() {
        let registry = builtin_registry();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let cond = where_condition(&registry, "users", None, &mut rng);
            let set: HashSet<_> = cond.columns.iter().collect();
            assert_eq!(set.len(), cond.columns.len());
            assert!((1..=3).contains(&cond.columns.len()));
            for c in &cond.columns {
                assert!(registry.columns("users").contains(c));
            }
        }
    }

    #[test]
    fn test_single_connective_per_clause() {
        let registry = builtin_registry();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let cond = where_condition(&registry, "products", Some(3), &mut rng);
            let ands = cond.clause.matches(" AND ").count();
            let ors = cond.clause.matches(" OR ").count();
            match cond.connective {
                Connective::And => assert_eq!((ands, ors), (2, 0)),
                Connective::Or => assert_eq!((ands, ors), (0, 2)),
            }
        }
    }

    #[test]
    fn test_or_connective_proportion() {
        let registry = builtin_registry();
        let mut rng = StdRng::seed_from_u64(21);
        let n = 20_000;
        let ors = (0..n)
            .map(|_| where_condition(&registry, "orders", None, &mut rng))
            .filter(|cond| cond.connective == Connective::Or)
            .count();
        let share = ors as f64 / n as f64;
        assert!((share - 0.25).abs() < 0.02, "OR share {:.4}", share);
    }

    #[test]
    fn test_unregistered_table_uses_id() {
        let registry = builtin_registry();
        let mut rng = StdRng::seed_from_u64(5);
        let cond = where_condition(&registry, "ghost", None, &mut rng);
        assert_eq!(cond.columns, vec!["id".to_string()]);
        assert!(cond.clause.starts_with("ghost.id "));
    }
}
