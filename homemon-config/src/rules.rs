//! Built-in threshold rules used when the configuration file has none.

use homemon_classify::{RuleBook, ThresholdRule};

pub fn default_rules() -> RuleBook {
    let mut book = RuleBook::new();
    book.rules_insert(
        "temperature",
        vec![
            ThresholdRule::new(-50.0, 16.0, 40, "blue"),
            ThresholdRule::new(16.0, 18.0, 10, "cyan"),
            ThresholdRule::new(18.0, 24.0, 0, "green"),
            ThresholdRule::new(24.0, 27.0, 20, "orange"),
            ThresholdRule::new(27.0, 80.0, 45, "red"),
        ],
    );
    book.rules_insert(
        "humidity",
        vec![
            ThresholdRule::new(0.0, 30.0, 30, "orange"),
            ThresholdRule::new(30.0, 60.0, 0, "green"),
            ThresholdRule::new(60.0, 101.0, 30, "blue"),
        ],
    );
    book.rules_insert(
        "co2",
        vec![
            ThresholdRule::new(0.0, 1000.0, 0, "green"),
            ThresholdRule::new(1000.0, 1500.0, 25, "orange"),
            ThresholdRule::new(1500.0, 100_000.0, 50, "red"),
        ],
    );
    book.rules_insert(
        "noise",
        vec![
            ThresholdRule::new(0.0, 55.0, 0, "green"),
            ThresholdRule::new(55.0, 70.0, 15, "orange"),
            ThresholdRule::new(70.0, 200.0, 35, "red"),
        ],
    );
    book
}
