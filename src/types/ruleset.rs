use std::fmt;
use std::time::Instant;

use tracing::{debug, trace};

use super::error::EvalError;
use super::evaluation_report::{EvaluationReport, RuleOutcome};
use super::record::Record;
use super::rule::Rule;
use super::schema::Schema;
use crate::error::EligoError;
use crate::parse::ParseOptions;

/// How the verdicts of the rules in a [`RuleSet`] combine into one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Combine {
    /// Every rule must hold.
    #[default]
    All,
    /// At least one rule must hold.
    Any,
}

impl fmt::Display for Combine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combine::All => write!(f, "all"),
            Combine::Any => write!(f, "any"),
        }
    }
}

/// Builder for constructing a [`RuleSet`].
///
/// Rule sources are parsed, and checked against the schema if one is set,
/// when [`build()`](Self::build) is called.
///
/// # Example
///
/// ```
/// use eligo::{Record, RuleSetBuilder, Schema};
///
/// let rules = RuleSetBuilder::new()
///     .rule("senior", "age > 30")
///     .rule("sales", "department == 'Sales'")
///     .schema(Schema::eligibility())
///     .build()
///     .unwrap();
///
/// let record = Record::new().set("age", 35_i64).set("department", "Sales");
/// assert_eq!(rules.evaluate(&record), Ok(true));
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    pending: Vec<PendingRule>,
    combine: Combine,
    schema: Option<Schema>,
    options: ParseOptions,
}

#[derive(Debug)]
enum PendingRule {
    Source { name: String, source: String },
    Parsed(Rule),
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule from its source text.
    #[must_use]
    pub fn rule(mut self, name: &str, source: &str) -> Self {
        self.pending.push(PendingRule::Source {
            name: name.to_owned(),
            source: source.to_owned(),
        });
        self
    }

    /// Add an already parsed rule.
    #[must_use]
    pub fn add(mut self, rule: Rule) -> Self {
        self.pending.push(PendingRule::Parsed(rule));
        self
    }

    #[must_use]
    pub fn combine(mut self, combine: Combine) -> Self {
        self.combine = combine;
        self
    }

    /// Check every rule against `schema` at build time.
    #[must_use]
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Parser options used for rules added with [`rule()`](Self::rule).
    #[must_use]
    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse and validate the rules into an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`EligoError::EmptyRuleSet`] if no rule was added, the parse
    /// error of the first rule that fails to parse, or
    /// [`EligoError::Schema`] for the first rule the schema rejects.
    pub fn build(self) -> Result<RuleSet, EligoError> {
        if self.pending.is_empty() {
            return Err(EligoError::EmptyRuleSet);
        }

        let mut rules = Vec::with_capacity(self.pending.len());
        for pending in self.pending {
            let rule = match pending {
                PendingRule::Source { name, source } => {
                    Rule::with_options(name, source, &self.options)?
                }
                PendingRule::Parsed(rule) => rule,
            };
            if let Some(schema) = &self.schema {
                rule.check(schema).map_err(|source| EligoError::Schema {
                    rule: rule.name().to_owned(),
                    source,
                })?;
            }
            rules.push(rule);
        }

        debug!(rules = rules.len(), combine = %self.combine, "built rule set");
        Ok(RuleSet {
            rules,
            combine: self.combine,
        })
    }
}

/// An immutable collection of rules evaluated together into one verdict.
/// Thread-safe; share it behind `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub(crate) rules: Vec<Rule>,
    pub(crate) combine: Combine,
}

impl RuleSet {
    #[must_use]
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::new()
    }

    /// Evaluate the rule set against a record.
    ///
    /// Rules are evaluated in order and the set short-circuits the same way a
    /// chain of `AND` (for [`Combine::All`]) or `OR` (for [`Combine::Any`])
    /// does: rules after the deciding one are not evaluated.
    ///
    /// # Errors
    ///
    /// Returns the first [`EvalError`] raised by a rule that was evaluated.
    pub fn evaluate(&self, record: &Record) -> Result<bool, EvalError> {
        match self.combine {
            Combine::All => {
                for rule in &self.rules {
                    if !rule.evaluate(record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Combine::Any => {
                for rule in &self.rules {
                    if rule.evaluate(record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Evaluate every rule and collect a per-rule report.
    pub fn evaluate_detailed(&self, record: &Record) -> EvaluationReport {
        let start = Instant::now();
        let outcomes = self
            .rules
            .iter()
            .map(|rule| {
                let result = rule.evaluate(record);
                trace!(rule = rule.name(), ?result, "evaluated rule");
                RuleOutcome::new(rule.name(), result)
            })
            .collect();
        EvaluationReport::new(self.combine, outcomes, start.elapsed())
    }

    /// Parse a rule book (see [`parse_rule_book`](crate::parse::parse_rule_book))
    /// into a `RuleSet` combining its rules with [`Combine::All`].
    ///
    /// # Errors
    ///
    /// Returns [`EligoError`] on a malformed document, a rule that fails to
    /// parse, or a document without rules.
    pub fn from_dsl(input: &str) -> Result<Self, EligoError> {
        let rules = crate::parse::parse_rule_book(input)?;
        rules
            .into_iter()
            .fold(RuleSetBuilder::new(), RuleSetBuilder::add)
            .build()
    }

    /// Read a rule book file and build a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`EligoError`] on I/O failure or any error of
    /// [`from_dsl`](Self::from_dsl).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, EligoError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The first rule with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name() == name)
    }

    #[must_use]
    pub fn combine(&self) -> Combine {
        self.combine
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Always `false` for a built rule set; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(feature = "binary-cache")]
impl RuleSet {
    /// Serialize this rule set to a byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self)
    }

    /// Deserialize a rule set from bytes produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Serialize this rule set and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file and deserialize the rule set it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleSet({} rules, {})", self.rules.len(), self.combine)
    }
}
