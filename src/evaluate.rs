use crate::{CompareOp, EvalError, Expr, Record, Value, ValueKind};

/// Evaluate `expr` against `record`.
///
/// `AND` and `OR` short-circuit: the right operand is not evaluated when the
/// left one decides the result, so errors it would raise are never reported.
///
/// # Errors
///
/// Returns [`EvalError`] when a comparison that is actually reached names a
/// field missing from the record, finds a value of the wrong kind, or applies
/// an ordering operator to text.
pub fn evaluate(expr: &Expr, record: &Record) -> Result<bool, EvalError> {
    match expr {
        Expr::Compare { field, op, literal } => compare(field, *op, literal, record),
        Expr::And { left, right } => Ok(evaluate(left, record)? && evaluate(right, record)?),
        Expr::Or { left, right } => Ok(evaluate(left, record)? || evaluate(right, record)?),
        Expr::Not { operand } => Ok(!evaluate(operand, record)?),
    }
}

fn compare(field: &str, op: CompareOp, literal: &Value, record: &Record) -> Result<bool, EvalError> {
    let actual = record.get(field).ok_or_else(|| EvalError::UnknownField {
        field: field.to_owned(),
    })?;

    match literal {
        Value::Number(expected) => {
            let actual = actual.as_number().ok_or_else(|| EvalError::TypeMismatch {
                field: field.to_owned(),
                expected: ValueKind::Number,
            })?;
            Ok(op.compare_numbers(actual, *expected))
        }
        Value::Text(expected) => {
            if op.is_ordering() {
                return Err(EvalError::UnsupportedOperator {
                    field: field.to_owned(),
                    op,
                });
            }
            let actual = actual.as_text().ok_or_else(|| EvalError::TypeMismatch {
                field: field.to_owned(),
                expected: ValueKind::Text,
            })?;
            Ok(match op {
                CompareOp::Neq => actual != expected,
                _ => actual == expected,
            })
        }
    }
}

impl Expr {
    /// Evaluate this expression against a record. See [`evaluate`].
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] on a missing field or a type error.
    pub fn evaluate(&self, record: &Record) -> Result<bool, EvalError> {
        evaluate(self, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field, parse};

    fn employee() -> Record {
        Record::new()
            .set("age", 35_i64)
            .set("department", "Sales")
            .set("salary", 60_000_i64)
            .set("experience", 12_i64)
    }

    fn eval(rule: &str, record: &Record) -> Result<bool, EvalError> {
        parse(rule).unwrap().evaluate(record)
    }

    #[test]
    fn senior_sales_rule() {
        let rule = "(age > 30 AND department == 'Sales') OR (experience > 10)";
        assert_eq!(eval(rule, &employee()), Ok(true));

        let junior = Record::new()
            .set("age", 25_i64)
            .set("department", "HR")
            .set("experience", 2_i64);
        assert_eq!(eval(rule, &junior), Ok(false));
    }

    #[test]
    fn all_numeric_ops() {
        let record = Record::new().set("x", 10_i64);
        let cases = [
            ("x == 10", true),
            ("x != 10", false),
            ("x > 5", true),
            ("x > 10", false),
            ("x >= 10", true),
            ("x >= 11", false),
            ("x < 20", true),
            ("x <= 10", true),
            ("x <= 9", false),
        ];
        for (rule, expected) in cases {
            assert_eq!(eval(rule, &record), Ok(expected), "failed for {rule}");
        }
    }

    #[test]
    fn text_equality_is_exact() {
        let record = Record::new().set("department", "Sales");
        assert_eq!(eval("department == 'Sales'", &record), Ok(true));
        assert_eq!(eval("department == 'sales'", &record), Ok(false));
        assert_eq!(eval("department == 'Sales '", &record), Ok(false));
        assert_eq!(eval("department != 'HR'", &record), Ok(true));
    }

    #[test]
    fn numeric_text_coerces_for_numeric_literal() {
        let record = Record::from_form([("age", "35"), ("salary", "50000.5")]);
        assert_eq!(eval("age > 30", &record), Ok(true));
        assert_eq!(eval("salary >= 50000", &record), Ok(true));
        assert_eq!(eval("age == 35.0", &record), Ok(true));
    }

    #[test]
    fn non_numeric_text_against_number_is_type_mismatch() {
        let record = Record::new().set("age", "thirty");
        assert_eq!(
            eval("age > 30", &record),
            Err(EvalError::TypeMismatch {
                field: "age".into(),
                expected: ValueKind::Number,
            })
        );
    }

    #[test]
    fn number_against_text_literal_is_type_mismatch() {
        let record = Record::new().set("department", 7_i64);
        assert_eq!(
            eval("department == 'Sales'", &record),
            Err(EvalError::TypeMismatch {
                field: "department".into(),
                expected: ValueKind::Text,
            })
        );
    }

    #[test]
    fn ordering_on_text_is_unsupported() {
        let record = Record::new().set("department", "Sales");
        assert_eq!(
            eval("department > 'A'", &record),
            Err(EvalError::UnsupportedOperator {
                field: "department".into(),
                op: CompareOp::Gt,
            })
        );
    }

    #[test]
    fn unknown_field_is_checked_first() {
        assert_eq!(
            eval("missing > 'A'", &Record::new()),
            Err(EvalError::UnknownField {
                field: "missing".into()
            })
        );
    }

    #[test]
    fn and_short_circuits() {
        let record = Record::new().set("age", 20_i64);
        assert_eq!(eval("age > 30 AND missing == 1", &record), Ok(false));
        assert!(eval("age > 10 AND missing == 1", &record).is_err());
    }

    #[test]
    fn or_short_circuits() {
        let record = Record::new().set("age", 40_i64);
        assert_eq!(eval("age > 30 OR missing == 1", &record), Ok(true));
        assert!(eval("age > 50 OR missing == 1", &record).is_err());
    }

    #[test]
    fn negation() {
        let record = employee();
        assert_eq!(eval("NOT department == 'HR'", &record), Ok(true));
        assert_eq!(eval("NOT NOT department == 'HR'", &record), Ok(false));
        assert_eq!(
            eval("NOT (age > 30 AND salary < 10000)", &record),
            Ok(true)
        );
    }

    #[test]
    fn error_under_not_propagates() {
        assert!(matches!(
            eval("NOT missing == 1", &Record::new()),
            Err(EvalError::UnknownField { .. })
        ));
    }

    #[test]
    fn builder_expressions_evaluate() {
        let expr = field("age")
            .gte(18_i64)
            .and(!field("department").eq("Legal"));
        assert_eq!(evaluate(&expr, &employee()), Ok(true));
    }

    #[test]
    fn negative_and_fractional_numbers() {
        let record = Record::new().set("balance", -5.5_f64);
        assert_eq!(eval("balance < 0", &record), Ok(true));
        assert_eq!(eval("balance == -5.5", &record), Ok(true));
        assert_eq!(eval("balance > -6", &record), Ok(true));
    }
}
