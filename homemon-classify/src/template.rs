//! Alert templates: a name and a time-to-live, bound together ahead of any
//! reading.

use std::time::Duration;

use chrono::{DateTime, Utc};
use homemon_core::Alert;
use serde::{Deserialize, Serialize};

use crate::rules::ThresholdRule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertTemplate {
    pub name: String,
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl AlertTemplate {
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
        }
    }

    /// Template named `<kind>:<location>`, e.g. `co2:bedroom`.
    pub fn for_location(kind: &str, location: &str, ttl: Duration) -> Self {
        Self::new(format!("{kind}:{location}"), ttl)
    }

    /// Alert carrying the rule's severity and expiring `ttl` after `now`.
    pub fn alert(&self, rule: &ThresholdRule, now: DateTime<Utc>) -> Alert {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let expiry = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Alert::new(self.name.clone(), rule.priority, rule.colour.clone(), expiry)
    }
}
