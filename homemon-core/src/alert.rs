//! Alert entity and backing store key layout.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Namespace used for all registry keys unless configured otherwise.
pub const DEFAULT_PREFIX: &str = "homemon";

/// A named dashboard entry with a ranking priority, display colour and expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique name; the primary key in all three indexes.
    pub name: String,
    /// Higher is more urgent.
    pub priority: i64,
    /// Display tag, opaque to the registry.
    pub colour: String,
    /// Absolute deadline after which the alert is sweep-eligible.
    pub expiry: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        name: impl Into<String>,
        priority: i64,
        colour: impl Into<String>,
        expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            colour: colour.into(),
            expiry,
        }
    }

    /// Score stored in the expiry index (whole epoch seconds).
    #[inline]
    pub fn expiry_score(&self) -> f64 {
        expiry_to_score(self.expiry)
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: priority: {}, colour: {}, ttl: {}",
            self.name, self.priority, self.colour, self.expiry
        )
    }
}

pub(crate) fn expiry_to_score(expiry: DateTime<Utc>) -> f64 {
    expiry.timestamp() as f64
}

pub(crate) fn score_to_expiry(score: f64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(score as i64, 0).single()
}

/// Names of the three backing store structures that make up the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    namespace: String,
    priority: String,
    colour: String,
    ttl: String,
}

impl KeySpace {
    /// Key layout rooted at `prefix`, optionally extended with `sub_prefix`
    /// as `<prefix>:<sub_prefix>`.
    pub fn new(prefix: &str, sub_prefix: Option<&str>) -> Self {
        let namespace = match sub_prefix.filter(|s| !s.is_empty()) {
            Some(sub) => format!("{prefix}:{sub}"),
            None => prefix.to_string(),
        };
        Self {
            priority: format!("{namespace}:priority"),
            colour: format!("{namespace}:colour"),
            ttl: format!("{namespace}:ttl"),
            namespace,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Ranked set: member = alert name, score = priority.
    pub fn priority(&self) -> &str {
        &self.priority
    }

    /// Field map: field = alert name, value = colour.
    pub fn colour(&self) -> &str {
        &self.colour
    }

    /// Ranked set: member = alert name, score = expiry in epoch seconds.
    pub fn ttl(&self) -> &str {
        &self.ttl
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, None)
    }
}
