use eligo::{field, parse, parse_with, CompareOp, Expr, ParseErrorKind, ParseOptions, Value};

#[test]
fn reference_rule_parses() {
    let expr = parse("(age > 30 AND department == 'Sales') OR (experience > 10)").unwrap();
    assert_eq!(
        expr,
        field("age")
            .gt(30_i64)
            .and(field("department").eq("Sales"))
            .or(field("experience").gt(10_i64))
    );
}

#[test]
fn tree_shape_is_explicit() {
    let expr = parse("a == 1 OR b == 2 AND NOT c == 3").unwrap();
    let Expr::Or { left, right } = expr else {
        panic!("expected OR at the root");
    };
    assert!(matches!(*left, Expr::Compare { ref field, .. } if field == "a"));
    let Expr::And { left, right } = *right else {
        panic!("expected AND on the right");
    };
    assert!(matches!(*left, Expr::Compare { ref field, .. } if field == "b"));
    assert!(matches!(*right, Expr::Not { .. }));
}

#[test]
fn comparison_fields() {
    let expr = parse("salary <= 99.5").unwrap();
    match expr {
        Expr::Compare { field, op, literal } => {
            assert_eq!(field, "salary");
            assert_eq!(op, CompareOp::Lte);
            assert_eq!(literal, Value::Number(99.5));
        }
        other => panic!("expected Compare, got {other:?}"),
    }
}

#[test]
fn identifiers_allow_digits_and_underscores() {
    assert_eq!(
        parse("_score_2 >= 1").unwrap(),
        field("_score_2").gte(1_i64)
    );
}

#[test]
fn mixed_case_keywords() {
    assert_eq!(
        parse("a == 1 aNd NoT b == 2 oR c == 3").unwrap(),
        parse("a == 1 AND NOT b == 2 OR c == 3").unwrap()
    );
}

#[test]
fn display_is_canonical() {
    let expr = parse("NOT department == 'HR' and (age>=21 or experience > 5)").unwrap();
    assert_eq!(
        expr.to_string(),
        "NOT department == \"HR\" AND (age >= 21 OR experience > 5)"
    );
    assert_eq!(parse(&expr.to_string()).unwrap(), expr);
}

#[test]
fn errors_carry_offsets_and_messages() {
    let cases: &[(&str, usize, &str)] = &[
        ("", 0, "rule text is empty"),
        ("age >", 5, "expected a literal but reached the end of the rule"),
        ("age > 30 AND", 12, "expected an expression but reached the end of the rule"),
        ("(age > 30", 0, "unmatched parenthesis"),
        ("age > 30)", 8, "unmatched parenthesis"),
        ("age ! 30", 4, "unknown comparison operator '!'"),
        ("age > 30 ?", 9, "unrecognized token '?'"),
        ("dept == 'Sales", 8, "unterminated string literal"),
        (
            "age > 30 age",
            9,
            "unexpected field name 'age' after a complete expression",
        ),
        ("> 30", 0, "expected an expression but found operator '>'"),
    ];
    for &(input, offset, message) in cases {
        let err = parse(input).unwrap_err();
        assert_eq!(err.offset(), offset, "offset for {input:?}");
        assert_eq!(err.message(), message, "message for {input:?}");
        assert_eq!(
            err.to_string(),
            format!("parse error at offset {offset}: {message}")
        );
    }
}

#[test]
fn custom_depth_limit() {
    let options = ParseOptions::new().max_depth(3);
    assert!(parse_with("(((a == 1)))", &options).is_ok());
    let err = parse_with("((((a == 1))))", &options).unwrap_err();
    assert_eq!(err.kind(), &ParseErrorKind::NestingTooDeep { limit: 3 });
    assert_eq!(err.offset(), 3);
}

#[test]
fn default_depth_limit_guards_hostile_input() {
    let hostile = "(".repeat(100_000);
    let err = parse(&hostile).unwrap_err();
    assert!(matches!(err.kind(), ParseErrorKind::NestingTooDeep { .. }));
}

#[test]
fn default_height_limit_guards_hostile_chains() {
    let hostile = vec!["a == 1"; 20_000].join(" AND ");
    let err = parse(&hostile).unwrap_err();
    assert!(matches!(err.kind(), ParseErrorKind::TreeTooDeep { .. }));

    let options = ParseOptions::new().max_height(20_000);
    let expr = parse_with(&vec!["a == 1"; 2_000].join(" AND "), &options).unwrap();
    assert_eq!(expr.depth(), 2_000);
}
