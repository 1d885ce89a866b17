use thiserror::Error;

use super::expr::CompareOp;
use super::value::ValueKind;

/// Errors produced while evaluating an expression against a record.
///
/// Any of these aborts the evaluation; there is no partial verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("type mismatch on field '{field}': expected a {expected} value")]
    TypeMismatch { field: String, expected: ValueKind },

    #[error("operator '{op}' cannot compare text on field '{field}'")]
    UnsupportedOperator { field: String, op: CompareOp },
}

impl EvalError {
    /// The field whose comparison failed.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            EvalError::UnknownField { field }
            | EvalError::TypeMismatch { field, .. }
            | EvalError::UnsupportedOperator { field, .. } => field,
        }
    }
}

/// Errors produced when checking an expression against a [`Schema`](super::Schema).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("field '{field}' is not part of the schema")]
    UndefinedField { field: String },

    #[error("field '{field}' holds {declared} values but is compared with a {literal} literal")]
    KindMismatch {
        field: String,
        declared: ValueKind,
        literal: ValueKind,
    },

    #[error("operator '{op}' cannot be used on text field '{field}'")]
    UnsupportedOperator { field: String, op: CompareOp },
}
