//! # Correlator Registry
//!
//! Owns every correlator running in this process. Each registered name gets
//! its own [`CorrelatorBusAdapter`] task listening on the shared bus:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              CorrelatorRegistry              │
//! │                                              │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐    │
//! │  │ scores   │  │ rivals   │  │   ...    │    │
//! │  │  (task)  │  │  (task)  │  │          │    │
//! │  └────┬─────┘  └────┬─────┘  └──────────┘    │
//! │       └──────┬──────┘                        │
//! │              ▼                               │
//! │     ┌─────────────────┐                      │
//! │     │   Event Bus     │                      │
//! │     │  (shared-bus)   │                      │
//! │     └─────────────────┘                      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Names are unique: a second registration under the same name is rejected.

use std::collections::HashMap;
use std::sync::Arc;

use bridge_correlator::{
    ConfigError, CorrelatorBusAdapter, CorrelatorConfig, CorrelatorMetrics, MetricsSnapshot,
    RequestCorrelator, RequestExchange, TokioClock,
};
use parking_lot::RwLock;
use shared_bus::InMemoryEventBus;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Correlator '{0}' is already registered")]
    DuplicateName(String),

    #[error("Invalid correlator configuration: {0}")]
    Config(#[from] ConfigError),
}

struct RegisteredCorrelator {
    metrics: Arc<CorrelatorMetrics>,
    task: JoinHandle<()>,
}

/// The set of correlators sharing one bus and one exchange.
pub struct CorrelatorRegistry<E>
where
    E: RequestExchange + Clone + 'static,
{
    bus: Arc<InMemoryEventBus>,
    exchange: E,
    correlators: RwLock<HashMap<String, RegisteredCorrelator>>,
    /// Flipped to `true` once on shutdown; every adapter holds a receiver.
    shutdown_tx: watch::Sender<bool>,
}

impl<E> CorrelatorRegistry<E>
where
    E: RequestExchange + Clone + 'static,
{
    pub fn new(bus: Arc<InMemoryEventBus>, exchange: E) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            bus,
            exchange,
            correlators: RwLock::new(HashMap::new()),
            shutdown_tx,
        }
    }

    pub fn event_bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    /// Register a correlator and start its bus adapter.
    ///
    /// Must be called from within a tokio runtime.
    pub fn register(&self, config: CorrelatorConfig) -> Result<(), RegistryError> {
        config.validate()?;

        let mut correlators = self.correlators.write();
        if correlators.contains_key(&config.name) {
            return Err(RegistryError::DuplicateName(config.name));
        }

        let name = config.name.clone();
        let correlator = RequestCorrelator::new(config, self.exchange.clone(), TokioClock);
        let adapter = CorrelatorBusAdapter::new(Arc::clone(&self.bus), correlator);
        let metrics = adapter.metrics();
        let task = tokio::spawn(adapter.run(self.shutdown_tx.subscribe()));

        info!(correlator = %name, "[Registry] Correlator registered");
        correlators.insert(name, RegisteredCorrelator { metrics, task });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.correlators.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.correlators.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.correlators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.correlators.read().is_empty()
    }

    pub fn metrics(&self, name: &str) -> Option<MetricsSnapshot> {
        self.correlators
            .read()
            .get(name)
            .map(|entry| entry.metrics.snapshot())
    }

    /// Metrics for every correlator, sorted by name.
    pub fn snapshots(&self) -> Vec<(String, MetricsSnapshot)> {
        let mut snapshots: Vec<_> = self
            .correlators
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.metrics.snapshot()))
            .collect();
        snapshots.sort_by(|a, b| a.0.cmp(&b.0));
        snapshots
    }

    /// Stop every adapter and wait for its task to finish.
    ///
    /// Pending requests are dropped without their callbacks running.
    /// Returns the final metrics, sorted by name.
    pub async fn shutdown(self) -> Vec<(String, MetricsSnapshot)> {
        info!(correlators = self.len(), "[Registry] Shutting down");
        if self.shutdown_tx.send(true).is_err() {
            debug!("[Registry] No correlator task left to signal");
        }

        let mut snapshots = Vec::new();
        for (name, entry) in self.correlators.into_inner() {
            if let Err(e) = entry.task.await {
                warn!(correlator = %name, error = %e, "[Registry] Correlator task failed");
            }
            snapshots.push((name, entry.metrics.snapshot()));
        }
        snapshots.sort_by(|a, b| a.0.cmp(&b.0));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_correlator::{CorrelatorConfigBuilder, InMemoryExchange};
    use shared_bus::{BridgeEvent, EventFilter, EventPublisher, EventTopic};
    use std::time::Duration;

    fn registry() -> (CorrelatorRegistry<InMemoryExchange>, InMemoryExchange) {
        let exchange = InMemoryExchange::new();
        let registry = CorrelatorRegistry::new(Arc::new(InMemoryEventBus::new()), exchange.clone());
        (registry, exchange)
    }

    fn trigger(target: &str) -> BridgeEvent {
        BridgeEvent::RequestTriggered {
            target: target.to_string(),
            data: serde_json::json!({"chart": "hard"}),
            args: serde_json::json!({"row": 2}),
            callback: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let (registry, _exchange) = registry();
        registry.register(CorrelatorConfig::new("scores", 10.0).unwrap()).unwrap();
        registry.register(CorrelatorConfig::new("rivals", 5.0).unwrap()).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("scores"));
        assert!(!registry.contains("friends"));
        assert_eq!(registry.names(), vec!["rivals", "scores"]);
        assert_eq!(registry.metrics("scores"), Some(MetricsSnapshot::default()));
        assert_eq!(registry.metrics("friends"), None);

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let (registry, _exchange) = registry();
        registry.register(CorrelatorConfig::new("scores", 10.0).unwrap()).unwrap();

        let result = registry.register(CorrelatorConfig::new("scores", 3.0).unwrap());
        assert!(matches!(result, Err(RegistryError::DuplicateName(name)) if name == "scores"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let (registry, _exchange) = registry();
        let mut config = CorrelatorConfig::new("scores", 10.0).unwrap();
        config.poll_interval = Duration::ZERO;

        let result = registry.register(config);
        assert!(matches!(
            result,
            Err(RegistryError::Config(ConfigError::ZeroPollInterval))
        ));
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_registered_correlator_handles_triggers() {
        let (registry, exchange) = registry();
        let bus = registry.event_bus();
        let config = CorrelatorConfigBuilder::new("scores")
            .timeout_secs(5.0)
            .build()
            .unwrap();
        registry.register(config).unwrap();

        let mut outcomes = bus.subscribe(EventFilter::topics(vec![EventTopic::Response]));
        bus.publish(trigger("scores")).await;

        let id = loop {
            if let Some(id) = exchange.last_request_id() {
                break id;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        };
        exchange.respond(&id, &serde_json::json!({"score": 7}));

        let event = tokio::time::timeout(Duration::from_secs(2), outcomes.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            BridgeEvent::ResponseDelivered {
                source, response, ..
            } => {
                assert_eq!(source, "scores");
                assert_eq!(response, serde_json::json!({"score": 7}));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let snapshots = registry.shutdown().await;
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].0, "scores");
        assert_eq!(snapshots[0].1.responses_delivered, 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_all_tasks() {
        let (registry, _exchange) = registry();
        let bus = registry.event_bus();
        registry.register(CorrelatorConfig::new("scores", 10.0).unwrap()).unwrap();
        registry.register(CorrelatorConfig::new("rivals", 10.0).unwrap()).unwrap();
        assert_eq!(bus.subscriber_count(), 2);

        let snapshots = registry.shutdown().await;
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].0, "rivals");
        assert_eq!(bus.subscriber_count(), 0);
    }
}
