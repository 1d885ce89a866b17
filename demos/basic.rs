use eligo::{parse, Record};

fn main() {
    let rule = parse("(age > 30 AND department == 'Sales') OR (experience > 10)")
        .expect("failed to parse rule");

    println!("Rule: {rule}");

    let candidates = [
        Record::new()
            .set("age", 35_i64)
            .set("department", "Sales")
            .set("experience", 2_i64),
        Record::new()
            .set("age", 25_i64)
            .set("department", "HR")
            .set("experience", 12_i64),
        Record::new()
            .set("age", 25_i64)
            .set("department", "HR")
            .set("experience", 2_i64),
    ];

    for (i, record) in candidates.iter().enumerate() {
        match rule.evaluate(record) {
            Ok(eligible) => println!("Candidate {i}: eligible = {eligible}"),
            Err(err) => println!("Candidate {i}: {err}"),
        }
    }

    if let Err(err) = parse("age > ") {
        println!("Rejected rule: {err}");
    }
}
