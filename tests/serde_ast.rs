#![cfg(feature = "serde")]

use eligo::{field, parse, CompareOp, Expr, Record, Rule, Value};
use serde_json::json;

#[test]
fn expr_json_shape() {
    let expr = parse("NOT (age > 30 AND department == 'Sales')").unwrap();
    let value = serde_json::to_value(&expr).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "not",
            "operand": {
                "type": "and",
                "left": {"type": "compare", "field": "age", "op": ">", "literal": 30.0},
                "right": {"type": "compare", "field": "department", "op": "==", "literal": "Sales"}
            }
        })
    );
}

#[test]
fn expr_json_round_trip() {
    let expr = parse("(age > 30 AND department == 'Sales') OR (experience > 10)").unwrap();
    let text = serde_json::to_string(&expr).unwrap();
    let back: Expr = serde_json::from_str(&text).unwrap();
    assert_eq!(back, expr);
}

#[test]
fn compare_op_as_symbol() {
    for op in CompareOp::ALL {
        let text = serde_json::to_string(&op).unwrap();
        assert_eq!(text, format!("\"{}\"", op.symbol()));
        let back: CompareOp = serde_json::from_str(&text).unwrap();
        assert_eq!(back, op);
    }
}

#[test]
fn record_is_plain_map() {
    let record: Record =
        serde_json::from_value(json!({"age": 35, "department": "Sales", "salary": "50000"}))
            .unwrap();
    assert_eq!(record.get("age"), Some(&Value::Number(35.0)));
    assert_eq!(record.get("salary"), Some(&Value::Text("50000".into())));
    assert_eq!(
        parse("salary >= 50000 AND age > 30")
            .unwrap()
            .evaluate(&record),
        Ok(true)
    );
}

#[test]
fn rule_round_trip() {
    let rule = Rule::new("senior", "age > 30").unwrap();
    let value = serde_json::to_value(&rule).unwrap();
    assert_eq!(value["name"], "senior");
    assert_eq!(value["source"], "age > 30");
    let back: Rule = serde_json::from_value(value).unwrap();
    assert_eq!(back, rule);
}

#[test]
fn rule_with_tampered_expr_is_rejected() {
    let mut value = serde_json::to_value(Rule::new("senior", "age > 30").unwrap()).unwrap();
    value["expr"] = serde_json::to_value(field("age").gt(18_i64)).unwrap();
    let err = serde_json::from_value::<Rule>(value).unwrap_err();
    assert!(err.to_string().contains("does not match its source"));
}
