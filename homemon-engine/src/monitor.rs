//! ## homemon-engine::monitor
//! **Ingestion and sweeping under one cancellation token**

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::EngineError;
use crate::ingest::IngestionService;
use crate::source::SensorSource;
use crate::sweeper::MaintenanceSweeper;

pub struct Monitor<S> {
    ingestion: IngestionService<S>,
    sweeper: MaintenanceSweeper,
}

impl<S: SensorSource> Monitor<S> {
    pub fn new(ingestion: IngestionService<S>, sweeper: MaintenanceSweeper) -> Self {
        Self { ingestion, sweeper }
    }

    /// Run until `cancel` fires. If ingestion cannot start, the sweeper is
    /// stopped too and the setup error is returned.
    pub async fn run(self, cancel: &CancellationToken) -> Result<(), EngineError> {
        let Self {
            mut ingestion,
            sweeper,
        } = self;
        let scope = cancel.child_token();

        let ingest = async {
            let result = ingestion.run(&scope).await;
            if result.is_err() {
                scope.cancel();
            }
            result
        };
        let (result, ()) = tokio::join!(ingest, sweeper.run(&scope));

        info!("Monitor stopped");
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use homemon_config::{default_rules, IngestConfig};
    use homemon_core::{AlertRegistry, KeySpace, MemoryStore};
    use homemon_transport::LogPublisher;
    use tokio::time::sleep;
    use tracing_test::traced_test;

    use super::*;
    use crate::source::{Reading, SimulatedSource, SourceError};

    struct BrokenSource;

    #[async_trait]
    impl SensorSource for BrokenSource {
        async fn refresh_credentials(&mut self) -> Result<Duration, SourceError> {
            Err(SourceError::Unavailable("connection refused".into()))
        }

        async fn poll(&mut self) -> Result<Vec<Reading>, SourceError> {
            Ok(Vec::new())
        }
    }

    fn registry() -> AlertRegistry {
        AlertRegistry::new(Arc::new(MemoryStore::new()), KeySpace::new("test", None))
    }

    #[tokio::test]
    async fn setup_failure_stops_everything() {
        let config = IngestConfig::default();
        let registry = registry();
        let ingestion = IngestionService::new(
            BrokenSource,
            registry.clone(),
            Arc::new(LogPublisher::default()),
            default_rules(),
            &config,
        );
        let monitor = Monitor::new(ingestion, MaintenanceSweeper::new(registry, config.cleanup_interval));
        let cancel = CancellationToken::new();

        let err = monitor.run(&cancel).await.unwrap_err();
        assert!(matches!(err, EngineError::Setup(_)));
        // The caller's token is left alone.
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn simulated_run_registers_alerts() {
        let config = IngestConfig::default();
        let registry = registry();
        let source = SimulatedSource::new("sim", config.locations.clone(), config.seed);
        let ingestion = IngestionService::new(
            source,
            registry.clone(),
            Arc::new(LogPublisher::default()),
            default_rules(),
            &config,
        );
        let monitor = Monitor::new(
            ingestion,
            MaintenanceSweeper::new(registry.clone(), config.cleanup_interval),
        );
        let cancel = CancellationToken::new();

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { monitor.run(&cancel).await })
        };
        sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        handle.await.unwrap().unwrap();

        // Built-in rules cover the whole simulated range, so every reading
        // becomes an alert: four kinds in two locations.
        let alerts = registry.list(&CancellationToken::new()).await.unwrap();
        assert_eq!(alerts.len(), 8);
        assert!(alerts.iter().any(|a| a.name == "co2:bedroom"));
        assert!(logs_contain("Publishing alert"));
        assert!(logs_contain("Monitor stopped"));
    }
}
