use std::fmt;
use std::time::Duration;

use super::error::EvalError;
use super::ruleset::Combine;

/// The result of evaluating one rule inside a detailed evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    name: String,
    result: Result<bool, EvalError>,
}

impl RuleOutcome {
    pub(crate) fn new(name: impl Into<String>, result: Result<bool, EvalError>) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn result(&self) -> &Result<bool, EvalError> {
        &self.result
    }

    /// `true` only if the rule evaluated without error to `true`.
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self.result, Ok(true))
    }

    #[must_use]
    pub fn error(&self) -> Option<&EvalError> {
        self.result.as_ref().err()
    }
}

/// Detailed evaluation report returned by
/// [`RuleSet::evaluate_detailed()`](super::ruleset::RuleSet::evaluate_detailed).
///
/// Unlike [`RuleSet::evaluate()`](super::ruleset::RuleSet::evaluate), every
/// rule is evaluated and errors are recorded per rule instead of aborting.
/// [`eligible()`](Self::eligible) treats a rule that failed to evaluate as
/// not satisfied.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    combine: Combine,
    outcomes: Vec<RuleOutcome>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(combine: Combine, outcomes: Vec<RuleOutcome>, duration: Duration) -> Self {
        Self {
            combine,
            outcomes,
            duration,
        }
    }

    /// The overall verdict under the rule set's [`Combine`] policy.
    #[must_use]
    pub fn eligible(&self) -> bool {
        match self.combine {
            Combine::All => self.outcomes.iter().all(RuleOutcome::passed),
            Combine::Any => self.outcomes.iter().any(RuleOutcome::passed),
        }
    }

    /// Per-rule outcomes, in rule set order.
    #[must_use]
    pub fn outcomes(&self) -> &[RuleOutcome] {
        &self.outcomes
    }

    /// Names of rules that evaluated to `true`.
    #[must_use]
    pub fn passed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.passed())
            .map(RuleOutcome::name)
            .collect()
    }

    /// Rules whose evaluation failed, with the error.
    #[must_use]
    pub fn errors(&self) -> Vec<(&str, &EvalError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error().map(|e| (o.name(), e)))
            .collect()
    }

    /// Wall-clock duration of the evaluation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "eligible: {}", self.eligible())?;
        write!(f, ", passed: [{}]", self.passed().join(", "))?;
        let errors: Vec<String> = self
            .errors()
            .into_iter()
            .map(|(name, err)| format!("{name}: {err}"))
            .collect();
        if !errors.is_empty() {
            write!(f, ", errors: [{}]", errors.join("; "))?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes() -> Vec<RuleOutcome> {
        vec![
            RuleOutcome::new("r1", Ok(true)),
            RuleOutcome::new("r2", Ok(false)),
            RuleOutcome::new(
                "r3",
                Err(EvalError::UnknownField {
                    field: "age".into(),
                }),
            ),
        ]
    }

    #[test]
    fn report_accessors() {
        let report = EvaluationReport::new(Combine::All, outcomes(), Duration::from_nanos(500));

        assert_eq!(report.outcomes().len(), 3);
        assert_eq!(report.passed(), vec!["r1"]);
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].0, "r3");
        assert_eq!(report.duration(), Duration::from_nanos(500));
    }

    #[test]
    fn all_requires_every_rule() {
        let report = EvaluationReport::new(Combine::All, outcomes(), Duration::ZERO);
        assert!(!report.eligible());

        let report = EvaluationReport::new(
            Combine::All,
            vec![RuleOutcome::new("a", Ok(true)), RuleOutcome::new("b", Ok(true))],
            Duration::ZERO,
        );
        assert!(report.eligible());
    }

    #[test]
    fn any_requires_one_rule() {
        let report = EvaluationReport::new(Combine::Any, outcomes(), Duration::ZERO);
        assert!(report.eligible());
    }

    #[test]
    fn error_counts_as_not_satisfied() {
        let report = EvaluationReport::new(Combine::Any, outcomes()[1..].to_vec(), Duration::ZERO);
        assert!(!report.eligible());
    }

    #[test]
    fn report_display() {
        let report = EvaluationReport::new(Combine::All, outcomes(), Duration::from_nanos(100));
        let s = report.to_string();
        assert!(s.contains("eligible: false"));
        assert!(s.contains("passed: [r1]"));
        assert!(s.contains("errors: [r3: unknown field 'age']"));
    }

    #[test]
    fn outcome_accessors() {
        let o = RuleOutcome::new("r", Ok(false));
        assert_eq!(o.name(), "r");
        assert_eq!(o.result(), &Ok(false));
        assert!(!o.passed());
        assert!(o.error().is_none());
    }
}
