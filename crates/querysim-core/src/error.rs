//! # Error Types
//!
//! Defines `QuerySimError`, the unified error enum for every failure mode in
//! the QuerySim pipeline. Configuration and schema problems surface at
//! initialization, before any round runs, so a bad `querysim.toml` never
//! produces a half-written dataset.

use thiserror::Error;

/// All errors that can occur in QuerySim operations.
#[derive(Error, Debug)]
pub enum QuerySimError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Unknown query pattern '{name}' in pattern weights\n  Known patterns: {known}")]
    UnknownPattern { name: String, known: String },

    #[error("Pattern weights sum to zero; at least one pattern needs a positive weight")]
    EmptyPatternWeights,

    #[error("Invalid feature payload: {message}")]
    InvalidPayload { message: String },

    #[error("Manifest error: {message}")]
    Manifest { message: String },

    #[error("Output error: {message}: {source}")]
    Output {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, QuerySimError>;
