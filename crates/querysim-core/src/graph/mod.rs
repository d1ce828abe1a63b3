pub mod join_graph;
pub mod visualize;
