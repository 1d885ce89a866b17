use std::sync::Arc;
use std::thread;

use eligo::{Record, RuleSetBuilder};

fn main() {
    let ruleset = Arc::new(
        RuleSetBuilder::new()
            .rule("adult", "age >= 18")
            .rule("sales", "department == 'Sales'")
            .build()
            .expect("failed to build rule set"),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let rs = Arc::clone(&ruleset);
            thread::spawn(move || {
                let record = Record::new()
                    .set("age", 16_i64 + i64::from(i))
                    .set("department", "Sales");

                let result = rs.evaluate(&record);
                println!("Thread {i}: {result:?}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
