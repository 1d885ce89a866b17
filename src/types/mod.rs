mod error;
mod evaluation_report;
mod expr;
mod record;
mod rule;
mod ruleset;
mod schema;
mod value;

pub use error::{EvalError, SchemaError};
pub use evaluation_report::{EvaluationReport, RuleOutcome};
pub use expr::{field, CompareOp, Expr, FieldExpr};
pub use record::Record;
pub use rule::Rule;
pub use ruleset::{Combine, RuleSet, RuleSetBuilder};
pub use schema::Schema;
pub use value::{Value, ValueKind};
