//! The ten query-shape generators.
//!
//! Every generator draws from the caller's random stream in a fixed order,
//! so a seeded stream always yields the same statement. Each returns a
//! [`QueryMetadata`] whose counts and flags describe exactly the text it
//! built.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::rules::is_additive_column;
use crate::error::{QuerySimError, Result};
use crate::generate::condition::where_condition;
use crate::generate::query::{JoinType, Pattern, PatternDetail, QueryMetadata, SortDirection};
use crate::schema::types::{JoinEdge, SchemaRegistry};

const LIMITS: &[u32] = &[10, 25, 50, 100, 500, 1000];
const MULTI_JOIN_TARGETS: &[usize] = &[2, 2, 3];
const AGGREGATES: &[&str] = &["SUM", "AVG", "MIN", "MAX"];
const HAVING_COMPARATORS: &[&str] = &[">", ">=", "<", "<="];
const DIRECTIONS: &[SortDirection] = &[SortDirection::Asc, SortDirection::Desc];

/// What the subquery pattern does when the outer table has no join edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubqueryFallback {
    /// Use any edge in the schema. The resulting subquery is not actually
    /// correlated with the outer table.
    #[default]
    AnyEdge,
    /// Only draw outer tables that have at least one touching edge.
    AdjacentOnly,
}

/// Read-only inputs shared by every generator call.
#[derive(Debug, Clone, Copy)]
pub struct PatternContext<'a> {
    pub registry: &'a SchemaRegistry,
    pub subquery_fallback: SubqueryFallback,
}

impl<'a> PatternContext<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            subquery_fallback: SubqueryFallback::default(),
        }
    }

    pub fn with_subquery_fallback(mut self, fallback: SubqueryFallback) -> Self {
        self.subquery_fallback = fallback;
        self
    }
}

/// Compose one statement of the given shape.
pub fn generate_pattern<R: Rng + ?Sized>(
    pattern: Pattern,
    ctx: &PatternContext<'_>,
    rng: &mut R,
) -> Result<QueryMetadata> {
    let registry = ctx.registry;
    match pattern {
        Pattern::SimpleSelect => simple_select(registry, rng),
        Pattern::SelectWhere => select_where(registry, rng),
        Pattern::SelectWhereOrder => select_where_order(registry, rng),
        Pattern::SelectLimit => select_limit(registry, rng),
        Pattern::SelectJoin => select_join(registry, rng),
        Pattern::SelectMultiJoin => select_multi_join(registry, rng),
        Pattern::SelectSubquery => select_subquery(registry, ctx.subquery_fallback, rng),
        Pattern::SelectGroupBy => select_group_by(registry, rng),
        Pattern::SelectHaving => select_having(registry, rng),
        Pattern::SelectDistinct => select_distinct(registry, rng),
    }
}

// ---------------------------------------------------------------------------
// Shared draws
// ---------------------------------------------------------------------------

/// Uniform pick from a non-empty constant list.
fn pick<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> T {
    items[rng.random_range(0..items.len())]
}

fn pick_table<'r, R: Rng + ?Sized>(registry: &'r SchemaRegistry, rng: &mut R) -> Result<&'r str> {
    let idx = rng.random_range(0..registry.table_count().max(1));
    registry
        .table_at(idx)
        .map(|t| t.name.as_str())
        .ok_or_else(|| QuerySimError::Schema {
            message: "schema has no tables".to_string(),
        })
}

fn pick_edge<'r, R: Rng + ?Sized>(
    registry: &'r SchemaRegistry,
    pattern: Pattern,
    rng: &mut R,
) -> Result<&'r JoinEdge> {
    registry
        .joins()
        .choose(rng)
        .ok_or_else(|| no_joins(pattern))
}

fn no_joins(pattern: Pattern) -> QuerySimError {
    QuerySimError::Schema {
        message: format!("pattern '{}' needs at least one join edge", pattern),
    }
}

/// Sample distinct columns of `table`. With no explicit count, 1 to 4.
fn pick_columns<R: Rng + ?Sized>(
    registry: &SchemaRegistry,
    table: &str,
    count: Option<usize>,
    rng: &mut R,
) -> Vec<String> {
    let cols = registry.columns(table);
    let n = match count {
        Some(n) => n,
        None => rng.random_range(1..=cols.len().min(4)),
    };
    cols.choose_multiple(rng, n.min(cols.len()))
        .cloned()
        .collect()
}

/// Either `["*"]` or a sampled unqualified column list.
fn select_list<R: Rng + ?Sized>(
    registry: &SchemaRegistry,
    table: &str,
    wildcard_probability: f64,
    rng: &mut R,
) -> (Vec<String>, bool) {
    if rng.random_bool(wildcard_probability) {
        (vec!["*".to_string()], true)
    } else {
        (pick_columns(registry, table, None, rng), false)
    }
}

fn qualify<'c>(table: &str, columns: &'c [String]) -> impl Iterator<Item = String> + 'c {
    let table = table.to_string();
    columns.iter().map(move |c| format!("{}.{}", table, c))
}

fn order_by<R: Rng + ?Sized>(
    registry: &SchemaRegistry,
    table: &str,
    rng: &mut R,
) -> (String, Vec<String>, SortDirection) {
    let cols = registry.columns(table);
    let n = rng.random_range(1..=cols.len().min(2));
    let chosen: Vec<String> = cols.choose_multiple(rng, n).cloned().collect();
    let direction = pick(DIRECTIONS, rng);
    let parts: Vec<String> = chosen
        .iter()
        .map(|c| format!("{}.{} {}", table, c, direction.as_sql()))
        .collect();
    (format!("ORDER BY {}", parts.join(", ")), chosen, direction)
}

/// COUNT for ids and anything non-additive; a random SUM/AVG/MIN/MAX for
/// money and quantities.
fn aggregate<R: Rng + ?Sized>(column: &str, rng: &mut R) -> String {
    if is_additive_column(column) {
        format!("{}({})", pick(AGGREGATES, rng), column)
    } else {
        format!("COUNT({})", column)
    }
}

/// Optional single-table WHERE with the given probability, returned as
/// ` WHERE ...` (leading space) plus its columns.
fn maybe_where<R: Rng + ?Sized>(
    registry: &SchemaRegistry,
    table: &str,
    probability: f64,
    count: Option<usize>,
    rng: &mut R,
) -> (String, Vec<String>) {
    if rng.random_bool(probability) {
        let cond = where_condition(registry, table, count, rng);
        (format!(" WHERE {}", cond.clause), cond.columns)
    } else {
        (String::new(), Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Single-table shapes
// ---------------------------------------------------------------------------

fn simple_select<R: Rng + ?Sized>(registry: &SchemaRegistry, rng: &mut R) -> Result<QueryMetadata> {
    let table = pick_table(registry, rng)?;
    let (cols, wildcard) = select_list(registry, table, 0.4, rng);

    let sql = format!("SELECT {} FROM {};", cols.join(", "), table);
    let mut meta = QueryMetadata::bare(Pattern::SimpleSelect, sql, vec![table.to_string()]);
    meta.has_wildcard = wildcard;
    Ok(meta)
}

fn select_where<R: Rng + ?Sized>(registry: &SchemaRegistry, rng: &mut R) -> Result<QueryMetadata> {
    let table = pick_table(registry, rng)?;
    let (cols, wildcard) = select_list(registry, table, 0.3, rng);
    let cond = where_condition(registry, table, None, rng);

    let sql = format!(
        "SELECT {} FROM {} WHERE {};",
        cols.join(", "),
        table,
        cond.clause
    );
    let mut meta = QueryMetadata::bare(Pattern::SelectWhere, sql, vec![table.to_string()]);
    meta.has_wildcard = wildcard;
    meta.conditions = cond.columns.len();
    meta.where_columns = cond.columns;
    Ok(meta)
}

fn select_where_order<R: Rng + ?Sized>(
    registry: &SchemaRegistry,
    rng: &mut R,
) -> Result<QueryMetadata> {
    let table = pick_table(registry, rng)?;
    let (cols, wildcard) = select_list(registry, table, 0.25, rng);
    let cond = where_condition(registry, table, None, rng);
    let (order_clause, order_cols, direction) = order_by(registry, table, rng);

    let sql = format!(
        "SELECT {} FROM {} WHERE {} {};",
        cols.join(", "),
        table,
        cond.clause,
        order_clause
    );
    let mut meta = QueryMetadata::bare(Pattern::SelectWhereOrder, sql, vec![table.to_string()]);
    meta.has_wildcard = wildcard;
    meta.has_order_by = true;
    meta.conditions = cond.columns.len();
    meta.where_columns = cond.columns;
    meta.order_by_columns = order_cols;
    meta.detail = PatternDetail::Ordered { direction };
    Ok(meta)
}

fn select_limit<R: Rng + ?Sized>(registry: &SchemaRegistry, rng: &mut R) -> Result<QueryMetadata> {
    let table = pick_table(registry, rng)?;
    let (cols, wildcard) = select_list(registry, table, 0.35, rng);
    let limit = pick(LIMITS, rng);
    let (where_clause, where_cols) = maybe_where(registry, table, 0.5, None, rng);

    let sql = format!(
        "SELECT {} FROM {}{} LIMIT {};",
        cols.join(", "),
        table,
        where_clause,
        limit
    );
    let mut meta = QueryMetadata::bare(Pattern::SelectLimit, sql, vec![table.to_string()]);
    meta.has_wildcard = wildcard;
    meta.has_limit = true;
    meta.conditions = where_cols.len();
    meta.where_columns = where_cols;
    meta.detail = PatternDetail::Limited { limit };
    Ok(meta)
}

fn select_distinct<R: Rng + ?Sized>(
    registry: &SchemaRegistry,
    rng: &mut R,
) -> Result<QueryMetadata> {
    let table = pick_table(registry, rng)?;
    let n = rng.random_range(1..=3);
    let cols = pick_columns(registry, table, Some(n), rng);
    let (where_clause, where_cols) = maybe_where(registry, table, 0.5, Some(1), rng);

    let sql = format!(
        "SELECT DISTINCT {} FROM {}{};",
        cols.join(", "),
        table,
        where_clause
    );
    let mut meta = QueryMetadata::bare(Pattern::SelectDistinct, sql, vec![table.to_string()]);
    meta.has_distinct = true;
    meta.conditions = where_cols.len();
    meta.where_columns = where_cols;
    Ok(meta)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

fn select_group_by<R: Rng + ?Sized>(
    registry: &SchemaRegistry,
    rng: &mut R,
) -> Result<QueryMetadata> {
    let table = pick_table(registry, rng)?;
    let cols = registry.columns(table);

    let group_count = rng.random_range(1..=cols.len().min(2));
    let group_cols: Vec<String> = cols.choose_multiple(rng, group_count).cloned().collect();

    // Aggregate over columns outside the grouping when the table has any.
    let mut remaining: Vec<&String> = cols.iter().filter(|c| !group_cols.contains(*c)).collect();
    if remaining.is_empty() {
        remaining = cols.iter().collect();
    }
    let agg_count = rng.random_range(1..=remaining.len().min(2));
    let agg_cols: Vec<&String> = remaining.choose_multiple(rng, agg_count).copied().collect();

    let mut select_parts: Vec<String> = qualify(table, &group_cols).collect();
    let aggregates: Vec<String> = agg_cols.iter().map(|c| aggregate(c, rng)).collect();
    select_parts.extend(aggregates.iter().cloned());

    let (where_clause, where_cols) = maybe_where(registry, table, 0.4, Some(1), rng);

    let group_clause: Vec<String> = qualify(table, &group_cols).collect();
    let sql = format!(
        "SELECT {} FROM {}{} GROUP BY {};",
        select_parts.join(", "),
        table,
        where_clause,
        group_clause.join(", ")
    );
    let mut meta = QueryMetadata::bare(Pattern::SelectGroupBy, sql, vec![table.to_string()]);
    meta.has_group_by = true;
    meta.conditions = where_cols.len();
    meta.where_columns = where_cols;
    meta.group_by_columns = group_cols;
    meta.detail = PatternDetail::Aggregate { aggregates };
    Ok(meta)
}

fn select_having<R: Rng + ?Sized>(registry: &SchemaRegistry, rng: &mut R) -> Result<QueryMetadata> {
    let table = pick_table(registry, rng)?;
    let cols = registry.columns(table);

    let group_col = cols[rng.random_range(0..cols.len())].clone();
    let mut remaining: Vec<&String> = cols.iter().filter(|c| **c != group_col).collect();
    if remaining.is_empty() {
        remaining = cols.iter().collect();
    }
    let agg_col = pick(&remaining, rng);

    let agg = aggregate(agg_col, rng);
    let threshold: u32 = rng.random_range(1..=100);
    let comparator = pick(HAVING_COMPARATORS, rng);

    let sql = format!(
        "SELECT {t}.{g}, {a} FROM {t} GROUP BY {t}.{g} HAVING {a} {c} {v};",
        t = table,
        g = group_col,
        a = agg,
        c = comparator,
        v = threshold
    );
    let mut meta = QueryMetadata::bare(Pattern::SelectHaving, sql, vec![table.to_string()]);
    meta.has_group_by = true;
    meta.has_having = true;
    meta.group_by_columns = vec![group_col];
    meta.detail = PatternDetail::Having {
        aggregate: agg,
        comparator,
        threshold,
    };
    Ok(meta)
}

// ---------------------------------------------------------------------------
// Join-driven shapes
// ---------------------------------------------------------------------------

fn select_join<R: Rng + ?Sized>(registry: &SchemaRegistry, rng: &mut R) -> Result<QueryMetadata> {
    let edge = pick_edge(registry, Pattern::SelectJoin, rng)?;
    let (child, parent) = (edge.child.as_str(), edge.parent.as_str());

    let wildcard = rng.random_bool(0.35);
    let select_cols = if wildcard {
        vec!["*".to_string()]
    } else {
        let n_child = rng.random_range(1..=3);
        let child_cols = pick_columns(registry, child, Some(n_child), rng);
        let n_parent = rng.random_range(1..=2);
        let parent_cols = pick_columns(registry, parent, Some(n_parent), rng);
        qualify(child, &child_cols)
            .chain(qualify(parent, &parent_cols))
            .collect()
    };

    let join_type = pick(&JoinType::ALL, rng);

    let (where_clause, where_cols) = if rng.random_bool(0.5) {
        let where_table = pick(&[child, parent], rng);
        let n = rng.random_range(1..=2);
        let cond = where_condition(registry, where_table, Some(n), rng);
        (format!(" WHERE {}", cond.clause), cond.columns)
    } else {
        (String::new(), Vec::new())
    };

    let sql = format!(
        "SELECT {} FROM {} {} {} ON {}{};",
        select_cols.join(", "),
        child,
        join_type.as_sql(),
        parent,
        edge.on_clause(),
        where_clause
    );
    let mut meta = QueryMetadata::bare(
        Pattern::SelectJoin,
        sql,
        vec![child.to_string(), parent.to_string()],
    );
    meta.joins = 1;
    meta.has_wildcard = wildcard;
    meta.conditions = where_cols.len();
    meta.where_columns = where_cols;
    meta.detail = PatternDetail::Join {
        join_type,
        edge: edge.clone(),
    };
    Ok(meta)
}

/// Grow a join tree from one random edge. Each extension must touch exactly
/// one table already in the tree, so no table is joined twice and the
/// clauses stay acyclic. Stops early when the tree cannot grow.
fn select_multi_join<R: Rng + ?Sized>(
    registry: &SchemaRegistry,
    rng: &mut R,
) -> Result<QueryMetadata> {
    let target = pick(MULTI_JOIN_TARGETS, rng);

    let first = pick_edge(registry, Pattern::SelectMultiJoin, rng)?;
    let base_table = first.child.clone();
    let mut tables = vec![first.child.clone(), first.parent.clone()];
    let first_type = pick(&JoinType::ALL, rng);
    let mut clauses = vec![format!(
        "{} {} ON {}",
        first_type.as_sql(),
        first.parent,
        first.on_clause()
    )];
    let mut edges = vec![first.clone()];

    for _ in 1..target {
        let candidates: Vec<&JoinEdge> = registry
            .joins()
            .iter()
            .filter(|e| tables.contains(&e.child) != tables.contains(&e.parent))
            .collect();
        let Some(edge) = candidates.choose(rng).copied() else {
            break;
        };
        let join_type = pick(&JoinType::ALL, rng);
        let new_table = if tables.contains(&edge.child) {
            edge.parent.clone()
        } else {
            edge.child.clone()
        };
        clauses.push(format!(
            "{} {} ON {}",
            join_type.as_sql(),
            new_table,
            edge.on_clause()
        ));
        tables.push(new_table);
        edges.push(edge.clone());
    }

    let wildcard = rng.random_bool(0.4);
    let select_cols = if wildcard {
        vec!["*".to_string()]
    } else {
        let mut all = Vec::new();
        for t in tables.iter().take(3) {
            let n = rng.random_range(1..=2);
            let cols = pick_columns(registry, t, Some(n), rng);
            all.extend(qualify(t, &cols));
        }
        all
    };

    let (where_clause, where_cols) = if rng.random_bool(0.4) {
        let where_table = tables[rng.random_range(0..tables.len())].clone();
        let cond = where_condition(registry, &where_table, Some(1), rng);
        (format!(" WHERE {}", cond.clause), cond.columns)
    } else {
        (String::new(), Vec::new())
    };

    let sql = format!(
        "SELECT {} FROM {} {}{};",
        select_cols.join(", "),
        base_table,
        clauses.join(" "),
        where_clause
    );
    let mut meta = QueryMetadata::bare(Pattern::SelectMultiJoin, sql, tables);
    meta.joins = clauses.len();
    meta.has_wildcard = wildcard;
    meta.conditions = where_cols.len();
    meta.where_columns = where_cols;
    meta.detail = PatternDetail::MultiJoin {
        target_joins: target,
        edges,
    };
    Ok(meta)
}

/// `outer.link IN (SELECT inner.col FROM inner [WHERE ...])`, correlated
/// through an edge touching the outer table.
fn select_subquery<R: Rng + ?Sized>(
    registry: &SchemaRegistry,
    fallback: SubqueryFallback,
    rng: &mut R,
) -> Result<QueryMetadata> {
    let outer = match fallback {
        SubqueryFallback::AnyEdge => pick_table(registry, rng)?,
        SubqueryFallback::AdjacentOnly => {
            let adjacent: Vec<&str> = registry
                .tables()
                .filter(|t| t.has_adjacency())
                .map(|t| t.name.as_str())
                .collect();
            if adjacent.is_empty() {
                return Err(no_joins(Pattern::SelectSubquery));
            }
            pick(&adjacent, rng)
        }
    };

    let touching = registry.joins_touching(outer);
    let (edge, correlated) = match touching.choose(rng) {
        Some(edge) => (*edge, true),
        None => {
            let edge = pick_edge(registry, Pattern::SelectSubquery, rng)?;
            debug!(outer, edge = %edge, "outer table has no join edge, using an unrelated edge");
            (edge, edge.touches(outer))
        }
    };

    let (inner, link_col, inner_col) = if edge.child == outer {
        (&edge.parent, &edge.child_column, &edge.parent_column)
    } else {
        (&edge.child, &edge.parent_column, &edge.child_column)
    };

    let n = rng.random_range(2..=4);
    let outer_cols = pick_columns(registry, outer, Some(n), rng);
    let select_cols: Vec<String> = qualify(outer, &outer_cols).collect();

    let (inner_where, _) = maybe_where(registry, inner, 0.5, Some(1), rng);

    let sql = format!(
        "SELECT {} FROM {o} WHERE {o}.{l} IN (SELECT {i}.{c} FROM {i}{w});",
        select_cols.join(", "),
        o = outer,
        l = link_col,
        i = inner,
        c = inner_col,
        w = inner_where
    );
    let mut meta = QueryMetadata::bare(
        Pattern::SelectSubquery,
        sql,
        vec![outer.to_string(), inner.clone()],
    );
    meta.conditions = 1;
    meta.subqueries = 1;
    meta.where_columns = vec![link_col.clone()];
    meta.detail = PatternDetail::Subquery {
        correlated,
        edge: edge.clone(),
    };
    Ok(meta)
}
