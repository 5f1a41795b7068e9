//! ## homemon-engine::ingest
//! **Collection loop: poll, publish raw, classify, register**
//!
//! Two timers run side by side once the service starts:
//! - metrics collection every `metrics_interval`
//! - credential refresh, `credential_margin` before the current credential
//!   lapses, but never more often than [`MIN_REFRESH`]
//!
//! A failed raw publish or a failed registry write is logged and the batch
//! carries on with the next reading. Only a failed initial credential refresh
//! stops the service.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use homemon_classify::{AlertTemplate, RuleBook};
use homemon_config::IngestConfig;
use homemon_core::{AlertRegistry, RegistryError};
use homemon_telemetry::{EventLogger, MetricsRecorder};
use homemon_transport::{RawMetric, RawPublisher};
use opentelemetry::KeyValue;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Span};

use crate::error::EngineError;
use crate::source::SensorSource;

/// Lower bound on the credential refresh period.
pub const MIN_REFRESH: Duration = Duration::from_secs(60);

/// Time until the next credential refresh.
pub fn refresh_period(validity: Duration, margin: Duration) -> Duration {
    validity.saturating_sub(margin).max(MIN_REFRESH)
}

/// Counts from one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordSummary {
    pub readings: usize,
    pub raw_published: usize,
    pub raw_failed: usize,
    pub alerts_published: usize,
    pub alerts_failed: usize,
    /// Readings that matched no rule for their kind.
    pub unclassified: usize,
}

pub struct IngestionService<S> {
    source: S,
    registry: AlertRegistry,
    publisher: Arc<dyn RawPublisher>,
    rules: RuleBook,
    alert_ttl: Duration,
    metrics_interval: Duration,
    credential_margin: Duration,
    metrics: Option<MetricsRecorder>,
    span: Span,
}

impl<S: SensorSource> IngestionService<S> {
    pub fn new(
        source: S,
        registry: AlertRegistry,
        publisher: Arc<dyn RawPublisher>,
        rules: RuleBook,
        config: &IngestConfig,
    ) -> Self {
        Self {
            source,
            registry,
            publisher,
            rules,
            alert_ttl: config.alert_ttl,
            metrics_interval: config.metrics_interval,
            credential_margin: config.credential_margin,
            metrics: None,
            span: info_span!("ingestion"),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// One collection. Only a failed poll or cancellation is an error.
    #[instrument(parent = &self.span, skip_all)]
    pub async fn record_once(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<RecordSummary, EngineError> {
        let readings = self.source.poll().await?;
        let now = Utc::now();
        let mut summary = RecordSummary {
            readings: readings.len(),
            ..RecordSummary::default()
        };

        for reading in &readings {
            let raw = RawMetric::new(
                &reading.metric,
                &reading.device_id,
                &reading.location,
                reading.value,
            );
            match self.publisher.publish(&raw).await {
                Ok(()) => {
                    summary.raw_published += 1;
                    if let Some(metrics) = &self.metrics {
                        metrics.raw_metrics.inc();
                    }
                }
                Err(e) => {
                    warn!(metric = %raw.name, location = %raw.location, error = %e, "Failed to publish raw metric");
                    summary.raw_failed += 1;
                }
            }

            let Some(rule) = self.rules.classify(&reading.kind, reading.value) else {
                debug!(kind = %reading.kind, value = reading.value, "No rule matched reading");
                summary.unclassified += 1;
                continue;
            };

            let alert = AlertTemplate::for_location(&reading.kind, &reading.location, self.alert_ttl)
                .alert(rule, now);
            match self.registry.put(&alert, cancel).await {
                Ok(()) => {
                    info!(alert = %alert.name, priority = alert.priority, colour = %alert.colour, current = reading.value, "Publishing alert");
                    summary.alerts_published += 1;
                    if let Some(metrics) = &self.metrics {
                        metrics.alerts_published.inc();
                    }
                    EventLogger::log_event(
                        "alert_published",
                        vec![
                            KeyValue::new("name", alert.name.clone()),
                            KeyValue::new("priority", alert.priority),
                            KeyValue::new("colour", alert.colour.clone()),
                        ],
                    )
                    .await;
                }
                Err(RegistryError::Cancelled) => return Err(RegistryError::Cancelled.into()),
                Err(e) => {
                    error!(alert = %alert.name, error = %e, "Failed to publish alert");
                    summary.alerts_failed += 1;
                    if let Some(metrics) = &self.metrics {
                        metrics.store_errors.inc();
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Refresh credentials, collect once, then keep collecting until `cancel`
    /// fires.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<(), EngineError> {
        let validity = self
            .source
            .refresh_credentials()
            .await
            .map_err(EngineError::Setup)?;
        let mut next_refresh = refresh_period(validity, self.credential_margin);
        debug!(parent: &self.span, ?validity, ?next_refresh, "Credentials obtained");

        self.record_logged(cancel).await;

        let mut collect = interval_at(Instant::now() + self.metrics_interval, self.metrics_interval);
        collect.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let refresh = sleep(next_refresh);
        tokio::pin!(refresh);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = &mut refresh => {
                    match self.source.refresh_credentials().await {
                        Ok(validity) => {
                            next_refresh = refresh_period(validity, self.credential_margin);
                            info!(parent: &self.span, ?next_refresh, "Credentials refreshed");
                        }
                        Err(e) => {
                            next_refresh = MIN_REFRESH;
                            error!(parent: &self.span, error = %e, "Credential refresh failed");
                        }
                    }
                    refresh.as_mut().reset(Instant::now() + next_refresh);
                }
                _ = collect.tick() => self.record_logged(cancel).await,
            }
        }

        info!(parent: &self.span, "Ingestion stopped");
        Ok(())
    }

    async fn record_logged(&mut self, cancel: &CancellationToken) {
        match self.record_once(cancel).await {
            Ok(summary) => debug!(parent: &self.span, ?summary, "Collection complete"),
            Err(EngineError::Registry(RegistryError::Cancelled)) => {}
            Err(e) => error!(parent: &self.span, error = %e, "Collection failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use homemon_classify::ThresholdRule;
    use homemon_core::{KeySpace, MemoryStore};
    use homemon_transport::ChannelPublisher;

    use super::*;
    use crate::source::{Reading, SourceError};

    #[derive(Clone, Default)]
    struct Counters {
        polls: Arc<AtomicUsize>,
        refreshes: Arc<AtomicUsize>,
    }

    struct ScriptedSource {
        readings: Vec<Reading>,
        validity: Result<Duration, SourceError>,
        counters: Counters,
    }

    #[async_trait]
    impl SensorSource for ScriptedSource {
        async fn refresh_credentials(&mut self) -> Result<Duration, SourceError> {
            self.counters.refreshes.fetch_add(1, Ordering::SeqCst);
            self.validity.clone()
        }

        async fn poll(&mut self) -> Result<Vec<Reading>, SourceError> {
            self.counters.polls.fetch_add(1, Ordering::SeqCst);
            Ok(self.readings.clone())
        }
    }

    fn rules() -> RuleBook {
        let mut book = RuleBook::new();
        book.rules_insert(
            "temperature",
            vec![
                ThresholdRule::new(18.0, 24.0, 0, "green"),
                ThresholdRule::new(24.0, 40.0, 45, "red"),
            ],
        );
        book
    }

    fn readings() -> Vec<Reading> {
        vec![
            Reading::new("temperature", "sensor.environmental.temperature", "dev", "bedroom", 26.5),
            Reading::new("temperature", "sensor.environmental.temperature", "dev", "attic", 55.0),
            Reading::new("humidity", "sensor.environmental.humidity", "dev", "bedroom", 40.0),
        ]
    }

    fn registry() -> AlertRegistry {
        AlertRegistry::new(Arc::new(MemoryStore::new()), KeySpace::default())
    }

    fn service(
        source: ScriptedSource,
        registry: AlertRegistry,
        publisher: Arc<dyn RawPublisher>,
    ) -> IngestionService<ScriptedSource> {
        IngestionService::new(source, registry, publisher, rules(), &IngestConfig::default())
    }

    fn scripted(validity: Result<Duration, SourceError>) -> (ScriptedSource, Counters) {
        let counters = Counters::default();
        let source = ScriptedSource {
            readings: readings(),
            validity,
            counters: counters.clone(),
        };
        (source, counters)
    }

    #[test]
    fn refresh_ahead_of_expiry_with_floor() {
        let margin = Duration::from_secs(30 * 60);
        assert_eq!(
            refresh_period(Duration::from_secs(3 * 60 * 60), margin),
            Duration::from_secs(150 * 60)
        );
        assert_eq!(refresh_period(Duration::from_secs(600), margin), MIN_REFRESH);
    }

    #[tokio::test]
    async fn publishes_raw_and_registers_classified_alerts() {
        let registry = registry();
        let (publisher, mut rx) = ChannelPublisher::new(Some("home".into()), 16);
        let (source, _) = scripted(Ok(Duration::from_secs(3600)));
        let metrics = MetricsRecorder::new().unwrap();
        let mut service =
            service(source, registry.clone(), Arc::new(publisher)).with_metrics(metrics.clone());
        let cancel = CancellationToken::new();

        let summary = service.record_once(&cancel).await.unwrap();

        assert_eq!(
            summary,
            RecordSummary {
                readings: 3,
                raw_published: 3,
                raw_failed: 0,
                alerts_published: 1,
                alerts_failed: 0,
                unclassified: 2,
            }
        );
        let subjects: Vec<String> = (0..3).map(|_| rx.try_recv().unwrap().subject).collect();
        assert_eq!(
            subjects,
            [
                "home.sensor.environmental.temperature",
                "home.sensor.environmental.temperature",
                "home.sensor.environmental.humidity",
            ]
        );

        let alerts = registry.list(&cancel).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].name, "temperature:bedroom");
        assert_eq!(alerts[0].priority, 45);
        assert_eq!(alerts[0].colour, "red");
        let ttl = alerts[0].expiry - Utc::now();
        assert!(ttl.num_seconds() > 280 && ttl.num_seconds() <= 300);

        assert_eq!(metrics.raw_metrics.get(), 3);
        assert_eq!(metrics.alerts_published.get(), 1);
    }

    #[tokio::test]
    async fn raw_publish_failure_does_not_block_alerts() {
        let registry = registry();
        let (publisher, rx) = ChannelPublisher::new(None, 1);
        drop(rx);
        let (source, _) = scripted(Ok(Duration::from_secs(3600)));
        let mut service = service(source, registry.clone(), Arc::new(publisher));

        let summary = service.record_once(&CancellationToken::new()).await.unwrap();

        assert_eq!(summary.raw_failed, 3);
        assert_eq!(summary.alerts_published, 1);
    }

    #[tokio::test]
    async fn cancelled_collection_stops_early() {
        let (publisher, _rx) = ChannelPublisher::new(None, 16);
        let (source, _) = scripted(Ok(Duration::from_secs(3600)));
        let mut service = service(source, registry(), Arc::new(publisher));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service.record_once(&cancel).await.unwrap_err();
        assert!(matches!(err, EngineError::Registry(RegistryError::Cancelled)));
    }

    #[tokio::test]
    async fn initial_refresh_failure_aborts() {
        let (publisher, _rx) = ChannelPublisher::new(None, 16);
        let (source, counters) = scripted(Err(SourceError::Credentials("expired token".into())));
        let mut service = service(source, registry(), Arc::new(publisher));

        let err = service.run(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Setup(SourceError::Credentials(_))));
        assert_eq!(counters.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn collects_on_schedule_until_cancelled() {
        let (publisher, _rx) = ChannelPublisher::new(None, 1024);
        let (source, counters) = scripted(Ok(Duration::from_secs(40 * 60)));
        let mut service = service(source, registry(), Arc::new(publisher));
        let cancel = CancellationToken::new();

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { service.run(&cancel).await })
        };

        // Initial collection, then one every 3 minutes; refresh after 10 minutes.
        sleep(Duration::from_secs(11 * 60)).await;
        cancel.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(counters.polls.load(Ordering::SeqCst), 4);
        assert_eq!(counters.refreshes.load(Ordering::SeqCst), 2);
    }
}
