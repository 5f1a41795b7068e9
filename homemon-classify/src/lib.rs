//! # homemon-classify
//!
//! Maps numeric sensor readings onto alert severities.
//!
//! A reading is matched against an ordered list of half-open `[from, to)`
//! threshold rules; the first rule containing the value supplies the
//! priority and colour of the alert. `AlertTemplate` then turns the match
//! into an `Alert` with an expiry relative to the time of the reading.

pub mod rules;
pub mod template;

pub use rules::{classify, validate_rules, RuleBook, RuleError, ThresholdRule};
pub use template::AlertTemplate;
