//! Eligibility rules as text.
//!
//! A rule is a boolean expression over a record's fields:
//!
//! ```text
//! (age > 30 AND department == 'Sales') OR (experience > 10)
//! ```
//!
//! [`parse`] turns rule text into an [`Expr`]; [`evaluate`] decides it
//! against a [`Record`]. [`RuleSet`] groups named rules and combines their
//! verdicts.
//!
//! ```
//! use eligo::{parse, Record};
//!
//! let rule = parse("(age > 30 AND department == 'Sales') OR (experience > 10)").unwrap();
//! let record = Record::new()
//!     .set("age", 35_i64)
//!     .set("department", "Sales")
//!     .set("experience", 2_i64);
//! assert_eq!(rule.evaluate(&record), Ok(true));
//! ```

mod error;
mod evaluate;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use error::EligoError;
pub use evaluate::evaluate;
pub use parse::{parse, parse_with, ParseError, ParseErrorKind, ParseOptions};
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use types::{
    field, Combine, CompareOp, EvalError, EvaluationReport, Expr, FieldExpr, Record, Rule,
    RuleOutcome, RuleSet, RuleSetBuilder, Schema, SchemaError, Value, ValueKind,
};
