//! ## homemon-engine::sweeper
//! **Periodic removal of expired alerts**

use std::time::Duration;

use homemon_core::{AlertRegistry, RegistryError, SweepReport};
use homemon_telemetry::{EventLogger, MetricsRecorder};
use opentelemetry::KeyValue;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument, Span};

pub struct MaintenanceSweeper {
    registry: AlertRegistry,
    interval: Duration,
    metrics: Option<MetricsRecorder>,
    span: Span,
}

impl MaintenanceSweeper {
    pub fn new(registry: AlertRegistry, interval: Duration) -> Self {
        Self {
            registry,
            interval,
            metrics: None,
            span: info_span!("sweeper"),
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

    /// Remove every alert that has expired by now.
    pub async fn sweep_once(&self, cancel: &CancellationToken) -> Result<SweepReport, RegistryError> {
        let started = std::time::Instant::now();
        let result = self.registry.sweep(None, false, cancel).await;
        if let Some(metrics) = &self.metrics {
            metrics.sweep_duration.observe(started.elapsed().as_secs_f64());
        }

        let removed = match &result {
            Ok(report) => report.removed.as_slice(),
            Err(RegistryError::PartialSweepFailure { removed, .. }) => removed.as_slice(),
            Err(_) => &[],
        };
        for name in removed {
            EventLogger::log_event("alert_swept", vec![KeyValue::new("name", name.clone())])
                .instrument(self.span.clone())
                .await;
        }
        if let Some(metrics) = &self.metrics {
            metrics.alerts_swept.inc_by(removed.len() as u64);
            // Cancellation is a shutdown, not a store fault.
            if matches!(&result, Err(e) if !matches!(e, RegistryError::Cancelled)) {
                metrics.store_errors.inc();
            }
        }

        result
    }

    /// Sweep on every tick until `cancel` fires. Failures are logged and the
    /// next tick tries again.
    pub async fn run(&self, cancel: &CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.sweep_once(cancel).await {
                Ok(report) if !report.removed.is_empty() => {
                    info!(parent: &self.span, removed = ?report.removed, "Expired alerts removed");
                }
                Ok(_) => {}
                Err(RegistryError::Cancelled) => break,
                Err(RegistryError::PartialSweepFailure { removed, failures }) => {
                    warn!(parent: &self.span, removed = removed.len(), failed = failures.len(), "Sweep incomplete, retrying next tick");
                }
                Err(e) => error!(parent: &self.span, error = %e, "Sweep failed"),
            }
        }

        info!(parent: &self.span, "Sweeper stopped");
    }
}
