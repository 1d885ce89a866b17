use thiserror::Error;

use crate::parse::ParseError;
use crate::{EvalError, SchemaError};

/// Unified error type covering parsing, schema checks, evaluation, and I/O.
///
/// Returned by convenience methods like [`RuleSet::from_dsl()`](crate::RuleSet::from_dsl)
/// and [`RuleSetBuilder::build()`](crate::RuleSetBuilder::build).
#[derive(Debug, Error)]
pub enum EligoError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("rule '{rule}': {source}")]
    Schema { rule: String, source: SchemaError },

    #[error("rule '{rule}': {source}")]
    InRule { rule: String, source: ParseError },

    #[error("rule book line {line}: {message}")]
    RuleBook { line: usize, message: String },

    #[error("rule name must not be empty")]
    EmptyRuleName,

    #[error("rule set contains no rules")]
    EmptyRuleSet,

    #[error("rule '{rule}': expression does not match its source text")]
    SourceMismatch { rule: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
