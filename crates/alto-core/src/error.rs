//! Core error types

use thiserror::Error;

/// Syntactic failure while parsing an address literal.
///
/// Existence in the topology is checked separately, so "malformed" and
/// "unknown" never share a variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid endpoint address: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid address prefix: {0}")]
    InvalidPrefix(String),
}

/// Failure while building a [`crate::TopologyStore`]
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PID {pid}: {source}")]
    Prefix {
        pid: String,
        #[source]
        source: DecodeError,
    },

    #[error("Prefix {prefix} assigned to both {first} and {second}")]
    DuplicatePrefix {
        prefix: String,
        first: String,
        second: String,
    },

    #[error("Unknown cost type: {0}")]
    UnknownCostType(String),

    #[error("Cost table {cost_type} references unknown PID {pid}")]
    UnknownPid { cost_type: String, pid: String },

    #[error("Cost table {cost_type} has invalid cost {cost} for {src} -> {dst}")]
    InvalidCost {
        cost_type: String,
        src: String,
        dst: String,
        cost: f64,
    },
}
