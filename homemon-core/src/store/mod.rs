//! ## homemon-core::store
//! **Backing store capability interface**
//!
//! The registry needs two kinds of structure from the external store:
//! - a ranked set: members ordered by a numeric score, with range queries
//! - a field map: plain field -> value pairs
//!
//! Every call must be atomic for the key it touches. Nothing more is assumed;
//! in particular there is no multi-key transaction.

use async_trait::async_trait;

use crate::error::StoreError;

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::{redact_url, RedisStore};

/// Inclusive score bounds for a ranked set query. `None` is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ScoreRange {
    /// Every member.
    pub fn all() -> Self {
        Self::default()
    }

    /// Members with `score <= max`.
    pub fn up_to(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    #[inline]
    pub fn contains(&self, score: f64) -> bool {
        self.min.map_or(true, |min| score >= min) && self.max.map_or(true, |max| score <= max)
    }
}

/// Direction of a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Minimal associative store used by the registry.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Insert `member` into the ranked set at `key`, or move it to `score`.
    async fn ranked_upsert(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError>;

    /// Remove `member`. Returns whether it was present; absence is not an error.
    async fn ranked_remove(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Members whose score lies in `range`, with their scores, in `order`.
    async fn ranked_range(
        &self,
        key: &str,
        range: ScoreRange,
        order: Order,
    ) -> Result<Vec<(String, f64)>, StoreError>;

    /// Score of a single member.
    async fn ranked_score(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError>;

    async fn field_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    async fn field_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Remove `field`. Returns whether it was present; absence is not an error.
    async fn field_delete(&self, key: &str, field: &str) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_range_bounds_are_inclusive() {
        let range = ScoreRange {
            min: Some(1.0),
            max: Some(3.0),
        };
        assert!(range.contains(1.0));
        assert!(range.contains(3.0));
        assert!(!range.contains(0.5));
        assert!(!range.contains(3.5));

        assert!(ScoreRange::all().contains(f64::MIN));
        assert!(ScoreRange::up_to(10.0).contains(-1e12));
        assert!(!ScoreRange::up_to(10.0).contains(10.5));
    }
}
