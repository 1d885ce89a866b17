use std::fmt;

use tracing::debug;

use super::error::{EvalError, SchemaError};
use super::expr::Expr;
use super::record::Record;
use super::schema::Schema;
use crate::error::EligoError;
use crate::parse::ParseOptions;

/// A named rule: the text an operator authored plus its parsed expression.
///
/// The expression is always a successful parse of the source text under the
/// rule's parser options. A rule whose text does not parse is never
/// constructed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RuleParts"))]
pub struct Rule {
    name: String,
    source: String,
    expr: Expr,
    options: ParseOptions,
}

impl Rule {
    /// Parse `source` into a new rule.
    ///
    /// # Errors
    ///
    /// Returns [`EligoError::EmptyRuleName`] for a blank name and
    /// [`EligoError::Parse`] if the source is not a valid rule expression.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self, EligoError> {
        Self::with_options(name, source, &ParseOptions::default())
    }

    /// Like [`Rule::new`], with explicit parser options.
    ///
    /// # Errors
    ///
    /// See [`Rule::new`].
    pub fn with_options(
        name: impl Into<String>,
        source: impl Into<String>,
        options: &ParseOptions,
    ) -> Result<Self, EligoError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EligoError::EmptyRuleName);
        }
        let source = source.into();
        let expr = crate::parse::parse_with(&source, options).map_err(|err| {
            debug!(rule = %name, offset = err.offset(), error = %err, "rule failed to parse");
            err
        })?;
        Ok(Self {
            name,
            source,
            expr,
            options: *options,
        })
    }

    /// Restore a rule from storage, verifying that `expr` is what `source`
    /// parses to.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Rule::new`], or [`EligoError::SourceMismatch`]
    /// when the stored expression differs from a fresh parse.
    pub fn from_parts(
        name: impl Into<String>,
        source: impl Into<String>,
        expr: Expr,
    ) -> Result<Self, EligoError> {
        Self::from_parts_with(name, source, expr, &ParseOptions::default())
    }

    /// Like [`Rule::from_parts`], re-parsing with explicit parser options.
    ///
    /// # Errors
    ///
    /// See [`Rule::from_parts`].
    pub fn from_parts_with(
        name: impl Into<String>,
        source: impl Into<String>,
        expr: Expr,
        options: &ParseOptions,
    ) -> Result<Self, EligoError> {
        let rule = Self::with_options(name, source, options)?;
        if rule.expr != expr {
            return Err(EligoError::SourceMismatch { rule: rule.name });
        }
        Ok(rule)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The parser options the source was parsed with.
    #[must_use]
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Evaluate this rule against a record.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if a comparison the evaluation reaches cannot be
    /// performed on the record.
    pub fn evaluate(&self, record: &Record) -> Result<bool, EvalError> {
        crate::evaluate::evaluate(&self.expr, record)
    }

    /// Check this rule's expression against a schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found.
    pub fn check(&self, schema: &Schema) -> Result<(), SchemaError> {
        schema.check(&self.expr)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.source)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RuleParts {
    name: String,
    source: String,
    expr: Expr,
    #[serde(default)]
    options: ParseOptions,
}

#[cfg(feature = "serde")]
impl TryFrom<RuleParts> for Rule {
    type Error = EligoError;

    fn try_from(parts: RuleParts) -> Result<Self, Self::Error> {
        Rule::from_parts_with(parts.name, parts.source, parts.expr, &parts.options)
    }
}
