use petgraph::visit::EdgeRef;

use crate::graph::join_graph::JoinGraph;

/// Output format for graph visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Mermaid,
    Dot,
}

/// Render the join graph. Isolated tables are drawn with a dashed border.
pub fn visualize(graph: &JoinGraph, format: GraphFormat) -> String {
    match format {
        GraphFormat::Mermaid => generate_mermaid(graph),
        GraphFormat::Dot => generate_dot(graph),
    }
}

fn generate_mermaid(graph: &JoinGraph) -> String {
    let mut output = String::from("graph TD\n");

    for node in graph.graph.node_indices() {
        let name = graph.table_name(node);
        output.push_str(&format!("    {}[{}]\n", name, name));
    }

    output.push('\n');

    for edge in graph.graph.edge_references() {
        let from = graph.table_name(edge.source());
        let to = graph.table_name(edge.target());
        let label = format!(
            "{} = {}",
            edge.weight().child_column,
            edge.weight().parent_column
        );
        output.push_str(&format!("    {} -->|{}| {}\n", from, label, to));
    }

    let isolated = graph.isolated_tables();
    if !isolated.is_empty() {
        output.push_str("\n    %% Tables without join edges\n");
        output.push_str("    classDef isolated stroke-dasharray: 5 5\n");
        output.push_str(&format!("    class {} isolated\n", isolated.join(",")));
    }

    output
}

fn generate_dot(graph: &JoinGraph) -> String {
    let mut output = String::from("digraph joins {\n");
    output.push_str("    rankdir=TB;\n");
    output.push_str("    node [shape=box, style=rounded];\n\n");

    for name in graph.isolated_tables() {
        output.push_str(&format!("    \"{}\" [style=\"rounded,dashed\"];\n", name));
    }

    for edge in graph.graph.edge_references() {
        let from = graph.table_name(edge.source());
        let to = graph.table_name(edge.target());
        let label = format!(
            "{} = {}",
            edge.weight().child_column,
            edge.weight().parent_column
        );
        output.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
            from, to, label
        ));
    }

    output.push_str("}\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{JoinEdge, SchemaRegistry};

    fn small_graph() -> JoinGraph {
        let registry = SchemaRegistry::new(
            vec![
                ("users".to_string(), vec!["id".to_string()]),
                (
                    "orders".to_string(),
                    vec!["id".to_string(), "user_id".to_string()],
                ),
                ("logs".to_string(), vec!["id".to_string()]),
            ],
            vec![JoinEdge::new("orders", "user_id", "users", "id")],
        )
        .unwrap();
        JoinGraph::from_registry(&registry)
    }

    #[test]
    fn test_mermaid_output() {
        let output = visualize(&small_graph(), GraphFormat::Mermaid);
        assert!(output.starts_with("graph TD"));
        assert!(output.contains("orders -->|user_id = id| users"));
        assert!(output.contains("class logs isolated"));
    }

    #[test]
    fn test_dot_output() {
        let output = visualize(&small_graph(), GraphFormat::Dot);
        assert!(output.starts_with("digraph joins {"));
        assert!(output.contains("\"orders\" -> \"users\" [label=\"user_id = id\"];"));
        assert!(output.contains("\"logs\" [style=\"rounded,dashed\"];"));
        assert!(output.trim_end().ends_with('}'));
    }
}
