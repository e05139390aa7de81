//! Crate-level error types.

use crate::expression::{EvalError, SyntaxError};
use crate::schema::{ParameterDocument, SchemaError};
use crate::settings::ConfigError;
use crate::validation::Warning;
use thiserror::Error;

/// A malformed table, blend or experiment.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Everything that can go wrong between raw input and a parsed document.
#[derive(Debug, Error)]
pub enum BpxError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Evaluation(#[from] EvalError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Strict mode: consistency warnings escalated. The parsed document is
    /// kept for diagnostics.
    #[error("{} consistency check(s) failed: {}", .warnings.len(), join_warnings(.warnings))]
    Consistency {
        warnings: Vec<Warning>,
        document: Box<ParameterDocument>,
    },
}

fn join_warnings(warnings: &[Warning]) -> String {
    warnings
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for crate operations.
pub type BpxResult<T> = Result<T, BpxError>;
