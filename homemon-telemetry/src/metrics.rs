//! ## homemon-telemetry::metrics
//! **Prometheus counters for registry traffic**

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub alerts_published: IntCounter,
    pub alerts_swept: IntCounter,
    pub raw_metrics: IntCounter,
    pub store_errors: IntCounter,
    pub sweep_duration: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let alerts_published =
            IntCounter::new("homemon_alerts_published_total", "Alerts written to the registry")?;
        let alerts_swept =
            IntCounter::new("homemon_alerts_swept_total", "Expired alerts removed by sweeps")?;
        let raw_metrics =
            IntCounter::new("homemon_raw_metrics_total", "Raw sensor readings published")?;
        let store_errors = IntCounter::new(
            "homemon_store_errors_total",
            "Registry operations that failed against the backing store",
        )?;
        let sweep_duration = Histogram::with_opts(
            HistogramOpts::new("homemon_sweep_duration_seconds", "Wall time of one sweep")
                .buckets(vec![0.001, 0.01, 0.1, 1.0, 10.0]),
        )?;

        registry.register(Box::new(alerts_published.clone()))?;
        registry.register(Box::new(alerts_swept.clone()))?;
        registry.register(Box::new(raw_metrics.clone()))?;
        registry.register(Box::new(store_errors.clone()))?;
        registry.register(Box::new(sweep_duration.clone()))?;

        Ok(Self {
            registry,
            alerts_published,
            alerts_swept,
            raw_metrics,
            store_errors,
            sweep_duration,
        })
    }

    /// Text exposition of every registered metric.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::<u8>::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
