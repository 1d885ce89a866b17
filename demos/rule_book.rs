use eligo::{Record, RuleSet};

fn main() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/rules.elig");
    let ruleset = RuleSet::from_file(path).expect("failed to load rule book");

    println!("Loaded {ruleset}");
    for rule in ruleset.rules() {
        println!("  {rule}");
        println!("    parsed as {}", rule.expr());
    }

    let record = Record::new()
        .set("age", 45_i64)
        .set("department", "Engineering")
        .set("experience", 15_i64)
        .set("salary", 75_000_i64);

    match ruleset.evaluate(&record) {
        Ok(eligible) => println!("Eligible: {eligible}"),
        Err(err) => println!("Evaluation failed: {err}"),
    }
}
