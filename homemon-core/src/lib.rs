//! # homemon-core
//!
//! Ephemeral priority registry for dashboard alerts.
//!
//! An alert is one logical record split across three physical indexes in a
//! shared backing store:
//! - a ranked set keyed by name, scored by priority
//! - a field map from name to display colour
//! - a ranked set keyed by name, scored by expiry (epoch seconds)
//!
//! ### Key Submodules:
//! - `alert`: the `Alert` entity and the key layout (`KeySpace`)
//! - `store`: the `BackingStore` capability trait with in-memory and Redis implementations
//! - `registry`: `AlertRegistry`, which keeps the three indexes in step
//!
//! The registry holds no state of its own. All ordering guarantees come from
//! per-key atomicity in the store; a reader may briefly see a name in one
//! index but not yet in another while a write is in flight.

pub mod alert;
pub mod error;
pub mod registry;
pub mod store;

pub mod prelude {
    pub use crate::alert::*;
    pub use crate::error::*;
    pub use crate::registry::*;
    pub use crate::store::*;
}

pub use alert::{Alert, KeySpace, DEFAULT_PREFIX};
pub use error::{Index, RegistryError, RegistryErrorKind, StoreError, SweepFailure};
pub use registry::{AlertRegistry, ListPolicy, SweepReport};
pub use store::{BackingStore, MemoryStore, Order, ScoreRange};
#[cfg(feature = "redis")]
pub use store::{redact_url, RedisStore};
