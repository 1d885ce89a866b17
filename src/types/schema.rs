use std::collections::HashMap;

use super::error::SchemaError;
use super::expr::Expr;
use super::value::ValueKind;

/// Declares which fields a rule may reference and what kind of value each holds.
///
/// Checking a rule against a schema at creation time turns evaluation errors
/// that would otherwise only show up for some records (an unknown field, a
/// text literal on a numeric field) into an upfront rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Schema {
    fields: HashMap<String, ValueKind>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard eligibility schema: `age`, `salary` and `experience` are
    /// numeric, `department` is text.
    #[must_use]
    pub fn eligibility() -> Self {
        Self::new()
            .field("age", ValueKind::Number)
            .field("department", ValueKind::Text)
            .field("salary", ValueKind::Number)
            .field("experience", ValueKind::Number)
    }

    /// Declare a field, replacing any previous declaration.
    #[must_use]
    pub fn field(mut self, name: &str, kind: ValueKind) -> Self {
        self.fields.insert(name.to_owned(), kind);
        self
    }

    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<ValueKind> {
        self.fields.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check every comparison in `expr`, reporting the first violation in
    /// left-to-right order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if a comparison references an undeclared field,
    /// uses a literal of the wrong kind, or orders a text field.
    pub fn check(&self, expr: &Expr) -> Result<(), SchemaError> {
        match expr {
            Expr::Compare { field, op, literal } => {
                let declared = self
                    .kind_of(field)
                    .ok_or_else(|| SchemaError::UndefinedField {
                        field: field.clone(),
                    })?;
                if declared != literal.kind() {
                    return Err(SchemaError::KindMismatch {
                        field: field.clone(),
                        declared,
                        literal: literal.kind(),
                    });
                }
                if declared == ValueKind::Text && op.is_ordering() {
                    return Err(SchemaError::UnsupportedOperator {
                        field: field.clone(),
                        op: *op,
                    });
                }
                Ok(())
            }
            Expr::And { left, right } | Expr::Or { left, right } => {
                self.check(left)?;
                self.check(right)
            }
            Expr::Not { operand } => self.check(operand),
        }
    }
}
