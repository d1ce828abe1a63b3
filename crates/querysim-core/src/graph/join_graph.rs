use std::collections::HashMap;

use petgraph::algo::{connected_components, is_cyclic_undirected};
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::schema::types::{JoinEdge, SchemaRegistry};

/// The registry's foreign keys as a directed graph.
/// Edges point from the table holding the key to the referenced table
/// (child → parent).
pub struct JoinGraph {
    pub graph: DiGraph<String, JoinEdge>,
    pub node_indices: HashMap<String, NodeIndex>,
}

impl JoinGraph {
    /// One node per registered table, one edge per join edge.
    pub fn from_registry(registry: &SchemaRegistry) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for name in registry.table_names() {
            let idx = graph.add_node(name.to_string());
            node_indices.insert(name.to_string(), idx);
        }

        for edge in registry.joins() {
            if let (Some(&from), Some(&to)) = (
                node_indices.get(&edge.child),
                node_indices.get(&edge.parent),
            ) {
                graph.add_edge(from, to, edge.clone());
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    pub fn table_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub fn node_index(&self, table_name: &str) -> Option<NodeIndex> {
        self.node_indices.get(table_name).copied()
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Tables with no join edge in either direction, in registry order.
    /// The subquery pattern cannot correlate on these.
    pub fn isolated_tables(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|&n| self.graph.neighbors_undirected(n).next().is_none())
            .map(|n| self.table_name(n))
            .collect()
    }

    /// Number of weakly connected components, isolated tables included.
    pub fn component_count(&self) -> usize {
        connected_components(&self.graph)
    }

    /// Largest number of joins a multi-join statement can chain before it
    /// runs out of unused neighbors: the size of the biggest component
    /// minus one.
    pub fn max_join_depth(&self) -> usize {
        let mut components = UnionFind::<usize>::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            components.union(edge.source().index(), edge.target().index());
        }
        let mut sizes: HashMap<usize, usize> = HashMap::new();
        for label in components.into_labeling() {
            *sizes.entry(label).or_default() += 1;
        }
        sizes.values().max().map_or(0, |size| size - 1)
    }
}

/// Whether `edges` form a tree: connected, acyclic, and with exactly one
/// more table than edges.
pub fn is_join_tree(edges: &[JoinEdge]) -> bool {
    if edges.is_empty() {
        return false;
    }
    let mut graph: UnGraph<&str, ()> = UnGraph::new_undirected();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
    for edge in edges {
        for table in [edge.child.as_str(), edge.parent.as_str()] {
            nodes
                .entry(table)
                .or_insert_with(|| graph.add_node(table));
        }
        graph.add_edge(nodes[edge.child.as_str()], nodes[edge.parent.as_str()], ());
    }
    nodes.len() == edges.len() + 1
        && !is_cyclic_undirected(&graph)
        && connected_components(&graph) == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builtin::builtin_registry;

    #[test]
    fn test_build_graph() {
        let graph = JoinGraph::from_registry(&builtin_registry());
        assert_eq!(graph.table_count(), 20);
        assert_eq!(graph.edge_count(), 16);
        assert!(graph.node_index("orders").is_some());
    }

    #[test]
    fn test_isolated_tables() {
        let graph = JoinGraph::from_registry(&builtin_registry());
        assert_eq!(
            graph.isolated_tables(),
            vec!["suppliers", "customers", "transactions", "logs"]
        );
    }

    #[test]
    fn test_components() {
        let graph = JoinGraph::from_registry(&builtin_registry());
        // Commerce cluster, HR cluster, and the four isolated tables.
        assert_eq!(graph.component_count(), 6);
        assert!(graph.max_join_depth() >= 3);
    }

    #[test]
    fn test_max_join_depth_uses_largest_component() {
        let registry = SchemaRegistry::new(
            vec![
                ("a".to_string(), vec!["id".to_string()]),
                ("b".to_string(), vec!["id".to_string(), "a_id".to_string()]),
                ("c".to_string(), vec!["id".to_string(), "a_id".to_string()]),
                ("x".to_string(), vec!["id".to_string()]),
                ("y".to_string(), vec!["id".to_string(), "x_id".to_string()]),
            ],
            vec![
                JoinEdge::new("b", "a_id", "a", "id"),
                JoinEdge::new("c", "a_id", "a", "id"),
                JoinEdge::new("y", "x_id", "x", "id"),
            ],
        )
        .unwrap();
        let graph = JoinGraph::from_registry(&registry);
        assert_eq!(graph.max_join_depth(), 2);
        assert_eq!(graph.component_count(), 2);
    }

    #[test]
    fn test_join_tree_detection() {
        let path = vec![
            JoinEdge::new("orders", "user_id", "users", "id"),
            JoinEdge::new("payments", "order_id", "orders", "id"),
        ];
        assert!(is_join_tree(&path));

        let disconnected = vec![
            JoinEdge::new("orders", "user_id", "users", "id"),
            JoinEdge::new("tasks", "project_id", "projects", "id"),
        ];
        assert!(!is_join_tree(&disconnected));

        let cycle = vec![
            JoinEdge::new("orders", "user_id", "users", "id"),
            JoinEdge::new("reviews", "user_id", "users", "id"),
            JoinEdge::new("reviews", "product_id", "orders", "id"),
        ];
        assert!(!is_join_tree(&cycle));
        assert!(!is_join_tree(&[]));
    }
}
