//! ## homemon-classify::rules
//! **Threshold rules and first-match classification**
//!
//! Rules are evaluated in list order. Overlapping ranges are allowed; the
//! earlier rule wins. A value outside every range produces no alert.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("rule {position}: range [{from}, {to}) is empty")]
    EmptyRange { position: usize, from: f64, to: f64 },

    #[error("rule {position}: colour must not be empty")]
    MissingColour { position: usize },
}

/// One severity band: readings in `[from, to)` map to `priority` and `colour`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub from: f64,
    pub to: f64,
    pub priority: i64,
    pub colour: String,
}

impl ThresholdRule {
    pub fn new(from: f64, to: f64, priority: i64, colour: impl Into<String>) -> Self {
        Self {
            from,
            to,
            priority,
            colour: colour.into(),
        }
    }

    #[inline]
    pub fn matches(&self, value: f64) -> bool {
        value >= self.from && value < self.to
    }
}

/// First rule whose range contains `value`.
pub fn classify(value: f64, rules: &[ThresholdRule]) -> Option<&ThresholdRule> {
    rules.iter().find(|rule| rule.matches(value))
}

/// Reject rule lists that can never match or carry no colour.
pub fn validate_rules(rules: &[ThresholdRule]) -> Result<(), RuleError> {
    for (position, rule) in rules.iter().enumerate() {
        // Negated so NaN bounds are rejected too.
        if !(rule.from < rule.to) {
            return Err(RuleError::EmptyRange {
                position,
                from: rule.from,
                to: rule.to,
            });
        }
        if rule.colour.trim().is_empty() {
            return Err(RuleError::MissingColour { position });
        }
    }
    Ok(())
}

/// Rule lists keyed by reading kind (`temperature`, `co2`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleBook {
    kinds: BTreeMap<String, Vec<ThresholdRule>>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rules for `kind`.
    pub fn rules_insert(&mut self, kind: impl Into<String>, rules: Vec<ThresholdRule>) {
        self.kinds.insert(kind.into(), rules);
    }

    pub fn rules_for(&self, kind: &str) -> &[ThresholdRule] {
        self.kinds.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Classify a reading of `kind`. Unknown kinds never match.
    pub fn classify(&self, kind: &str, value: f64) -> Option<&ThresholdRule> {
        classify(value, self.rules_for(kind))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Validate every rule list, naming the offending kind.
    pub fn validate(&self) -> Result<(), (String, RuleError)> {
        for (kind, rules) in &self.kinds {
            validate_rules(rules).map_err(|e| (kind.clone(), e))?;
        }
        Ok(())
    }
}

impl FromIterator<(String, Vec<ThresholdRule>)> for RuleBook {
    fn from_iter<I: IntoIterator<Item = (String, Vec<ThresholdRule>)>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().collect(),
        }
    }
}
