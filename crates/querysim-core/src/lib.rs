pub mod check;
pub mod classify;
pub mod config;
pub mod error;
pub mod features;
pub mod generate;
pub mod graph;
pub mod manifest;
pub mod output;
pub mod schema;
pub mod simulate;
pub mod summary;

// Re-export key types for convenience
pub use error::{QuerySimError, Result};
pub use features::{extract_features, FeatureVector, FEATURE_COLUMNS};
pub use generate::engine::{DatasetRecord, WorkloadGenerator};
pub use generate::query::{Pattern, QueryMetadata};
pub use schema::types::{JoinEdge, SchemaRegistry};
pub use simulate::CostModel;
