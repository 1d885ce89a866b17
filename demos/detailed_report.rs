use eligo::{Record, RuleSetBuilder, Schema};

fn main() {
    let ruleset = RuleSetBuilder::new()
        .rule(
            "senior_or_experienced",
            "(age > 30 AND department == 'Sales') OR (experience > 10)",
        )
        .rule("paid", "salary >= 50000")
        .rule("not_legal", "NOT department == 'Legal'")
        .schema(Schema::eligibility())
        .build()
        .expect("failed to build rule set");

    // As a web form would submit it; salary left blank.
    let record = Record::from_form([
        ("age", "41"),
        ("department", "Sales"),
        ("experience", "6"),
        ("salary", ""),
    ]);

    let report = ruleset.evaluate_detailed(&record);

    println!("{report}");
    println!();
    println!("Rules that held: {:?}", report.passed());
    for (rule, err) in report.errors() {
        println!("Rule {rule} could not be decided: {err}");
    }
    println!("Duration: {:?}", report.duration());
}
