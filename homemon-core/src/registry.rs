//! ## homemon-core::registry
//! **Three-index alert registry**
//!
//! Each alert lives in three backing store structures (priority ranking,
//! colour map, expiry ranking), all keyed by name. Writes touch them one at a
//! time in a fixed order; a reader can observe the gap between two steps.
//! What must hold is that no successful operation leaves them diverged:
//! - `put` writes priority, colour, expiry; a failure names the index and
//!   leaves earlier writes in place (a retried `put` overwrites all three)
//! - `delete` and `sweep` remove priority, colour, expiry; removing an absent
//!   entry is a no-op, so retries are safe
//!
//! Every operation takes a `CancellationToken` and honours the optional
//! per-call deadline set with `with_op_timeout`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Span};

use crate::alert::{expiry_to_score, score_to_expiry, Alert, KeySpace};
use crate::error::{Index, RegistryError, RegistryErrorKind, StoreError, SweepFailure};
use crate::store::{BackingStore, Order, ScoreRange};

const REMOVAL_ORDER: [Index; 3] = [Index::Priority, Index::Colour, Index::Expiry];

/// What `list` does with a name present in the priority index but missing
/// from the colour or expiry index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListPolicy {
    /// Log a warning and leave the entry out. Listing is a best-effort
    /// dashboard read.
    #[default]
    Skip,
    /// Fail the whole listing with `RegistryError::InconsistentEntry`.
    Fail,
}

/// Outcome of a sweep that did not fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Names whose expiry was at or before the reference time.
    pub expired: Vec<String>,
    /// Names this sweep removed from all three indexes. A name removed
    /// concurrently by another sweep or a delete is absent. Empty on a dry run.
    pub removed: Vec<String>,
    pub dry_run: bool,
}

/// Alert registry over a shared backing store.
///
/// Cheap to clone; clones share the store handle.
#[derive(Clone)]
pub struct AlertRegistry {
    store: Arc<dyn BackingStore>,
    keys: KeySpace,
    op_timeout: Option<Duration>,
    list_policy: ListPolicy,
    span: Span,
}

impl AlertRegistry {
    pub fn new(store: Arc<dyn BackingStore>, keys: KeySpace) -> Self {
        let span = info_span!("alert_registry", namespace = %keys.namespace());
        Self {
            store,
            keys,
            op_timeout: None,
            list_policy: ListPolicy::default(),
            span,
        }
    }

    /// Parent span for everything the registry logs.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Deadline applied to each individual backing store call.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = Some(timeout);
        self
    }

    pub fn with_list_policy(mut self, policy: ListPolicy) -> Self {
        self.list_policy = policy;
        self
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Insert or fully overwrite an alert.
    #[instrument(parent = &self.span, skip_all, fields(name = %alert.name))]
    pub async fn put(&self, alert: &Alert, cancel: &CancellationToken) -> Result<(), RegistryError> {
        validate(alert)?;

        self.call(
            Index::Priority,
            cancel,
            self.store
                .ranked_upsert(self.keys.priority(), &alert.name, alert.priority as f64),
        )
        .await?;
        self.call(
            Index::Colour,
            cancel,
            self.store
                .field_set(self.keys.colour(), &alert.name, &alert.colour),
        )
        .await?;
        self.call(
            Index::Expiry,
            cancel,
            self.store
                .ranked_upsert(self.keys.ttl(), &alert.name, alert.expiry_score()),
        )
        .await?;

        debug!(priority = alert.priority, colour = %alert.colour, expiry = %alert.expiry, "Alert stored");
        Ok(())
    }

    /// All alerts, highest priority first. Ties follow the store's native
    /// order and must not be relied on.
    #[instrument(parent = &self.span, skip_all)]
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Alert>, RegistryError> {
        let members = self
            .call(
                Index::Priority,
                cancel,
                self.store
                    .ranked_range(self.keys.priority(), ScoreRange::all(), Order::Descending),
            )
            .await?;

        let mut alerts = Vec::with_capacity(members.len());
        for (name, score) in members {
            if let Some(alert) = self.hydrate(name, score, cancel).await? {
                alerts.push(alert);
            }
        }
        debug!(count = alerts.len(), "Alerts listed");
        Ok(alerts)
    }

    /// Direct lookup of a single alert.
    #[instrument(parent = &self.span, skip(self, cancel))]
    pub async fn get(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Alert>, RegistryError> {
        let score = self
            .call(
                Index::Priority,
                cancel,
                self.store.ranked_score(self.keys.priority(), name),
            )
            .await?;
        match score {
            Some(score) => self.hydrate(name.to_string(), score, cancel).await,
            None => Ok(None),
        }
    }

    /// Remove an alert from all three indexes.
    ///
    /// A name absent from the priority index but still present in the colour
    /// or expiry index (an earlier delete or sweep stopped part way) is
    /// cleaned up rather than reported missing, so a retried delete succeeds.
    #[instrument(parent = &self.span, skip(self, cancel))]
    pub async fn delete(&self, name: &str, cancel: &CancellationToken) -> Result<(), RegistryError> {
        let ranked = self
            .call(
                Index::Priority,
                cancel,
                self.store.ranked_score(self.keys.priority(), name),
            )
            .await?
            .is_some();

        if !ranked {
            let coloured = self
                .call(
                    Index::Colour,
                    cancel,
                    self.store.field_get(self.keys.colour(), name),
                )
                .await?
                .is_some();
            let expiring = self
                .call(
                    Index::Expiry,
                    cancel,
                    self.store.ranked_score(self.keys.ttl(), name),
                )
                .await?
                .is_some();
            if !coloured && !expiring {
                return Err(RegistryError::NotFound(name.to_string()));
            }
            warn!("Removing leftovers of a partially removed alert");
        }

        for index in REMOVAL_ORDER {
            self.remove_from(index, name, cancel).await?;
        }
        info!("Alert deleted");
        Ok(())
    }

    /// Remove every alert whose expiry is at or before `now` (wall clock when
    /// `None`). With `dry_run` nothing is touched and the candidates are
    /// returned.
    ///
    /// One alert failing does not stop the others. Its remaining index entries
    /// stay behind, expiry last, so the next sweep finds it again.
    #[instrument(parent = &self.span, skip(self, cancel))]
    pub async fn sweep(
        &self,
        now: Option<DateTime<Utc>>,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<SweepReport, RegistryError> {
        let now = now.unwrap_or_else(Utc::now);
        let expired: Vec<String> = self
            .call(
                Index::Expiry,
                cancel,
                self.store.ranked_range(
                    self.keys.ttl(),
                    ScoreRange::up_to(expiry_to_score(now)),
                    Order::Ascending,
                ),
            )
            .await?
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        debug!(alerts = ?expired, "Alerts to sweep");
        if dry_run {
            info!(count = expired.len(), "Dry run, not removing alerts");
            return Ok(SweepReport {
                expired,
                removed: Vec::new(),
                dry_run: true,
            });
        }

        let mut removed = Vec::with_capacity(expired.len());
        let mut failures = Vec::new();
        'alerts: for name in &expired {
            let mut claimed = false;
            for index in REMOVAL_ORDER {
                let kind = match self.remove_from(index, name, cancel).await {
                    Ok(gone) => {
                        // The expiry entry is removed last and only once; whoever
                        // removes it owns the alert's removal.
                        if index == Index::Expiry {
                            claimed = gone;
                        }
                        continue;
                    }
                    Err(RegistryError::BackingStoreUnavailable { source, .. }) => {
                        RegistryErrorKind::Store(source)
                    }
                    Err(RegistryError::TimedOut { after, .. }) => RegistryErrorKind::TimedOut(after),
                    Err(other) => return Err(other),
                };
                error!(alert = %name, %index, error = %kind, "Failed to sweep alert");
                failures.push(SweepFailure {
                    name: name.clone(),
                    index,
                    error: kind,
                });
                continue 'alerts;
            }
            if claimed {
                removed.push(name.clone());
            } else {
                debug!(alert = %name, "Alert already removed concurrently");
            }
        }

        if failures.is_empty() {
            info!(count = removed.len(), "Sweep complete");
            Ok(SweepReport {
                expired,
                removed,
                dry_run: false,
            })
        } else {
            Err(RegistryError::PartialSweepFailure { removed, failures })
        }
    }

    async fn hydrate(
        &self,
        name: String,
        priority: f64,
        cancel: &CancellationToken,
    ) -> Result<Option<Alert>, RegistryError> {
        let colour = self
            .call(
                Index::Colour,
                cancel,
                self.store.field_get(self.keys.colour(), &name),
            )
            .await?;
        let expiry = self
            .call(
                Index::Expiry,
                cancel,
                self.store.ranked_score(self.keys.ttl(), &name),
            )
            .await?;

        let (colour, expiry) = match (colour, expiry) {
            (Some(colour), Some(expiry)) => (colour, expiry),
            (None, _) => return self.on_drift(name, Index::Colour),
            (_, None) => return self.on_drift(name, Index::Expiry),
        };
        let expiry = score_to_expiry(expiry).ok_or_else(|| {
            RegistryError::BackingStoreUnavailable {
                index: Index::Expiry,
                source: StoreError::Backend(format!("expiry score {expiry} out of range")),
            }
        })?;

        Ok(Some(Alert {
            name,
            priority: priority as i64,
            colour,
            expiry,
        }))
    }

    fn on_drift(&self, name: String, index: Index) -> Result<Option<Alert>, RegistryError> {
        match self.list_policy {
            ListPolicy::Skip => {
                warn!(alert = %name, %index, "Skipping inconsistent entry");
                Ok(None)
            }
            ListPolicy::Fail => Err(RegistryError::InconsistentEntry { name, index }),
        }
    }

    async fn remove_from(
        &self,
        index: Index,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, RegistryError> {
        match index {
            Index::Priority => {
                self.call(
                    index,
                    cancel,
                    self.store.ranked_remove(self.keys.priority(), name),
                )
                .await
            }
            Index::Colour => {
                self.call(
                    index,
                    cancel,
                    self.store.field_delete(self.keys.colour(), name),
                )
                .await
            }
            Index::Expiry => {
                self.call(index, cancel, self.store.ranked_remove(self.keys.ttl(), name))
                    .await
            }
        }
    }

    /// Run one store call under the cancellation token and the per-call deadline.
    async fn call<T, F>(
        &self,
        index: Index,
        cancel: &CancellationToken,
        fut: F,
    ) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let guarded = async {
            let result = match self.op_timeout {
                Some(after) => tokio::time::timeout(after, fut)
                    .await
                    .map_err(|_| RegistryError::TimedOut { index, after })?,
                None => fut.await,
            };
            result.map_err(|source| RegistryError::BackingStoreUnavailable { index, source })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RegistryError::Cancelled),
            result = guarded => result,
        }
    }
}

/// Largest priority magnitude a ranked-set score (an `f64`) holds exactly.
pub const MAX_PRIORITY: i64 = 1 << 53;

fn validate(alert: &Alert) -> Result<(), RegistryError> {
    if alert.name.is_empty() {
        return Err(RegistryError::InvalidAlert("name must not be empty".into()));
    }
    if alert.colour.is_empty() {
        return Err(RegistryError::InvalidAlert(format!(
            "colour of `{}` must not be empty",
            alert.name
        )));
    }
    if !(-MAX_PRIORITY..=MAX_PRIORITY).contains(&alert.priority) {
        return Err(RegistryError::InvalidAlert(format!(
            "priority {} of `{}` is outside ±{MAX_PRIORITY}",
            alert.priority, alert.name
        )));
    }
    Ok(())
}
