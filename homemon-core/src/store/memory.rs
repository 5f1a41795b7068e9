//! Process-local backing store.
//!
//! Used by tests and by single-process runs. State is lost when the process
//! exits, so separate CLI invocations do not see each other's alerts.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{BackingStore, Order, ScoreRange};
use crate::error::StoreError;

/// f64 with a total order so it can key a `BTreeSet`.
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Score lookup plus an ordered view. Equal scores order by member,
/// lexicographically, as Redis sorted sets do.
#[derive(Debug, Default)]
struct RankedSet {
    scores: HashMap<String, f64>,
    ordered: BTreeSet<(Score, String)>,
}

impl RankedSet {
    fn upsert(&mut self, member: &str, score: f64) {
        if let Some(old) = self.scores.insert(member.to_string(), score) {
            self.ordered.remove(&(Score(old), member.to_string()));
        }
        self.ordered.insert((Score(score), member.to_string()));
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(old) => {
                self.ordered.remove(&(Score(old), member.to_string()));
                true
            }
            None => false,
        }
    }

    fn range(&self, range: ScoreRange, order: Order) -> Vec<(String, f64)> {
        let matching = self
            .ordered
            .iter()
            .filter(|(score, _)| range.contains(score.0))
            .map(|(score, member)| (member.clone(), score.0));
        match order {
            Order::Ascending => matching.collect(),
            Order::Descending => {
                let mut out: Vec<_> = matching.collect();
                out.reverse();
                out
            }
        }
    }
}

/// In-memory ranked sets and field maps behind `parking_lot` locks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ranked: RwLock<HashMap<String, RankedSet>>,
    fields: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members in the ranked set at `key`.
    pub fn ranked_len(&self, key: &str) -> usize {
        self.ranked.read().get(key).map_or(0, |set| set.scores.len())
    }

    /// Number of fields in the map at `key`.
    pub fn field_len(&self, key: &str) -> usize {
        self.fields.read().get(key).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn ranked_upsert(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        if score.is_nan() {
            return Err(StoreError::Backend("score is not a valid float".into()));
        }
        self.ranked
            .write()
            .entry(key.to_string())
            .or_default()
            .upsert(member, score);
        Ok(())
    }

    async fn ranked_remove(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut ranked = self.ranked.write();
        let Some(set) = ranked.get_mut(key) else {
            return Ok(false);
        };
        let removed = set.remove(member);
        if set.scores.is_empty() {
            ranked.remove(key);
        }
        Ok(removed)
    }

    async fn ranked_range(
        &self,
        key: &str,
        range: ScoreRange,
        order: Order,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        Ok(self
            .ranked
            .read()
            .get(key)
            .map(|set| set.range(range, order))
            .unwrap_or_default())
    }

    async fn ranked_score(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError> {
        Ok(self
            .ranked
            .read()
            .get(key)
            .and_then(|set| set.scores.get(member).copied()))
    }

    async fn field_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.fields
            .write()
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn field_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .fields
            .read()
            .get(key)
            .and_then(|map| map.get(field).cloned()))
    }

    async fn field_delete(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let mut fields = self.fields.write();
        let Some(map) = fields.get_mut(key) else {
            return Ok(false);
        };
        let removed = map.remove(field).is_some();
        if map.is_empty() {
            fields.remove(key);
        }
        Ok(removed)
    }
}
