use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{QuerySimError, Result};

/// Column set handed out for tables the registry does not know about.
static FALLBACK_COLUMNS: LazyLock<Vec<String>> = LazyLock::new(|| vec!["id".to_string()]);

/// A directed foreign-key relation: `child.child_column` references
/// `parent.parent_column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JoinEdge {
    pub child: String,
    pub child_column: String,
    pub parent: String,
    pub parent_column: String,
}

impl JoinEdge {
    pub fn new(child: &str, child_column: &str, parent: &str, parent_column: &str) -> Self {
        Self {
            child: child.to_string(),
            child_column: child_column.to_string(),
            parent: parent.to_string(),
            parent_column: parent_column.to_string(),
        }
    }

    /// Whether either endpoint of the edge is `table`.
    pub fn touches(&self, table: &str) -> bool {
        self.child == table || self.parent == table
    }

    /// The `child.col = parent.col` predicate used in ON clauses.
    pub fn on_clause(&self) -> String {
        format!(
            "{}.{} = {}.{}",
            self.child, self.child_column, self.parent, self.parent_column
        )
    }
}

impl fmt::Display for JoinEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.child, self.child_column, self.parent, self.parent_column
        )
    }
}

/// A registered table: its ordered column set plus the join edges that
/// touch it, stored as indices into `SchemaRegistry::joins`.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    /// Edges where this table is the child (it holds the foreign key).
    pub outgoing: Vec<usize>,
    /// Edges where this table is the referenced parent.
    pub incoming: Vec<usize>,
}

impl Table {
    fn new(name: String, columns: Vec<String>) -> Self {
        Self {
            name,
            columns,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Whether any join edge touches this table.
    pub fn has_adjacency(&self) -> bool {
        !self.outgoing.is_empty() || !self.incoming.is_empty()
    }
}

/// Read-only description of the tables, columns, and join edges that
/// queries are composed from. Built once and never mutated.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    tables: IndexMap<String, Table>,
    joins: Vec<JoinEdge>,
}

impl SchemaRegistry {
    /// Build a registry, validating names and join references.
    ///
    /// Table order is preserved: it is the order random table picks index
    /// into, so it is part of the reproducibility contract for a seed.
    pub fn new<I>(tables: I, joins: Vec<JoinEdge>) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut map: IndexMap<String, Table> = IndexMap::new();
        for (name, columns) in tables {
            if columns.is_empty() {
                return Err(QuerySimError::Schema {
                    message: format!("table '{}' has no columns", name),
                });
            }
            let mut seen = HashSet::new();
            for col in &columns {
                if !seen.insert(col.as_str()) {
                    return Err(QuerySimError::Schema {
                        message: format!("table '{}' lists column '{}' twice", name, col),
                    });
                }
            }
            if map.contains_key(&name) {
                return Err(QuerySimError::Schema {
                    message: format!("table '{}' is registered twice", name),
                });
            }
            map.insert(name.clone(), Table::new(name, columns));
        }

        if map.is_empty() {
            return Err(QuerySimError::Schema {
                message: "schema has no tables".to_string(),
            });
        }

        for (idx, edge) in joins.iter().enumerate() {
            check_endpoint(&map, edge, &edge.child, &edge.child_column)?;
            check_endpoint(&map, edge, &edge.parent, &edge.parent_column)?;
            if edge.child == edge.parent {
                return Err(QuerySimError::Schema {
                    message: format!(
                        "join {} references its own table; self joins are not supported",
                        edge
                    ),
                });
            }

            if let Some(child) = map.get_mut(&edge.child) {
                child.outgoing.push(idx);
            }
            if let Some(parent) = map.get_mut(&edge.parent) {
                parent.incoming.push(idx);
            }
        }

        Ok(Self { tables: map, joins })
    }

    /// Rebuild a registry from a serialized snapshot.
    pub fn from_snapshot(snapshot: &SchemaSnapshot) -> Result<Self> {
        Self::new(
            snapshot
                .tables
                .iter()
                .map(|(name, cols)| (name.clone(), cols.clone())),
            snapshot.joins.clone(),
        )
    }

    /// Serializable form of the registry, used for manifests and hashing.
    pub fn snapshot(&self) -> SchemaSnapshot {
        SchemaSnapshot {
            tables: self
                .tables
                .iter()
                .map(|(name, t)| (name.clone(), t.columns.clone()))
                .collect(),
            joins: self.joins.clone(),
        }
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Table at registration position `index`.
    pub fn table_at(&self, index: usize) -> Option<&Table> {
        self.tables.get_index(index).map(|(_, t)| t)
    }

    /// Columns of `table`, or a single `id` column if it is unregistered.
    pub fn columns(&self, table: &str) -> &[String] {
        self.tables
            .get(table)
            .map(|t| t.columns.as_slice())
            .unwrap_or(FALLBACK_COLUMNS.as_slice())
    }

    pub fn joins(&self) -> &[JoinEdge] {
        &self.joins
    }

    /// Edges with `table` at either endpoint, in registry order.
    pub fn joins_touching(&self, table: &str) -> Vec<&JoinEdge> {
        self.joins.iter().filter(|jp| jp.touches(table)).collect()
    }

    pub fn outgoing_edges(&self, table: &str) -> Vec<&JoinEdge> {
        self.edge_refs(table, |t| &t.outgoing)
    }

    pub fn incoming_edges(&self, table: &str) -> Vec<&JoinEdge> {
        self.edge_refs(table, |t| &t.incoming)
    }

    fn edge_refs(&self, table: &str, pick: impl Fn(&Table) -> &Vec<usize>) -> Vec<&JoinEdge> {
        self.tables
            .get(table)
            .map(|t| pick(t).iter().map(|&i| &self.joins[i]).collect())
            .unwrap_or_default()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }

    pub fn join_count(&self) -> usize {
        self.joins.len()
    }
}

fn check_endpoint(
    tables: &IndexMap<String, Table>,
    edge: &JoinEdge,
    table: &str,
    column: &str,
) -> Result<()> {
    match tables.get(table) {
        None => Err(QuerySimError::Schema {
            message: format!("join {} references unknown table '{}'", edge, table),
        }),
        Some(t) if !t.columns.iter().any(|c| c == column) => Err(QuerySimError::Schema {
            message: format!(
                "join {} references column '{}' which does not exist in table '{}'",
                edge, column, table
            ),
        }),
        Some(_) => Ok(()),
    }
}

/// Serializable snapshot of a registry: table → ordered columns, plus joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tables: IndexMap<String, Vec<String>>,
    pub joins: Vec<JoinEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tables() -> SchemaRegistry {
        SchemaRegistry::new(
            vec![
                ("users".to_string(), vec!["id".to_string(), "name".to_string()]),
                (
                    "orders".to_string(),
                    vec!["id".to_string(), "user_id".to_string()],
                ),
            ],
            vec![JoinEdge::new("orders", "user_id", "users", "id")],
        )
        .unwrap()
    }

    #[test]
    fn test_unregistered_table_falls_back_to_id() {
        let registry = two_tables();
        assert_eq!(registry.columns("ghost"), &["id".to_string()]);
        assert_eq!(registry.columns("users").len(), 2);
    }

    #[test]
    fn test_adjacency_is_derived() {
        let registry = two_tables();
        assert_eq!(registry.outgoing_edges("orders").len(), 1);
        assert_eq!(registry.incoming_edges("users").len(), 1);
        assert!(registry.outgoing_edges("users").is_empty());
        assert_eq!(registry.joins_touching("users").len(), 1);
        assert!(registry.joins_touching("ghost").is_empty());
        assert!(registry.table("orders").unwrap().has_adjacency());
    }

    #[test]
    fn test_join_to_unknown_table_rejected() {
        let err = SchemaRegistry::new(
            vec![("users".to_string(), vec!["id".to_string()])],
            vec![JoinEdge::new("orders", "user_id", "users", "id")],
        )
        .unwrap_err();
        assert!(format!("{}", err).contains("orders"));
    }

    #[test]
    fn test_join_to_unknown_column_rejected() {
        let err = SchemaRegistry::new(
            vec![
                ("users".to_string(), vec!["id".to_string()]),
                ("orders".to_string(), vec!["id".to_string()]),
            ],
            vec![JoinEdge::new("orders", "user_id", "users", "id")],
        )
        .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("user_id"), "{}", msg);
    }

    #[test]
    fn test_self_referencing_join_rejected() {
        let err = SchemaRegistry::new(
            vec![(
                "categories".to_string(),
                vec!["id".to_string(), "parent_id".to_string()],
            )],
            vec![JoinEdge::new("categories", "parent_id", "categories", "id")],
        )
        .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("categories.parent_id"), "{}", msg);
        assert!(msg.contains("self joins"), "{}", msg);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = SchemaRegistry::new(
            vec![("users".to_string(), vec!["id".to_string(), "id".to_string()])],
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_schema_rejected() {
        let result = SchemaRegistry::new(Vec::<(String, Vec<String>)>::new(), Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_round_trip_preserves_order() {
        let registry = two_tables();
        let snapshot = registry.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: SchemaSnapshot = serde_json::from_str(&json).unwrap();
        let rebuilt = SchemaRegistry::from_snapshot(&parsed).unwrap();
        assert_eq!(rebuilt.table_names(), vec!["users", "orders"]);
        assert_eq!(rebuilt.joins(), registry.joins());
    }

    #[test]
    fn test_on_clause_format() {
        let edge = JoinEdge::new("orders", "user_id", "users", "id");
        assert_eq!(edge.on_clause(), "orders.user_id = users.id");
        assert_eq!(edge.to_string(), "orders.user_id -> users.id");
    }
}
