//! # Integration Test Flows
//!
//! Trigger → request file → launcher → response file → outcome, over a real
//! temporary save-data directory and real (short) poll intervals.
//!
//! ## Flows Tested:
//!
//! 1. **Delivery**: the callback and a `ResponseDelivered` event both carry
//!    the launcher's response and the trigger's args
//! 2. **Timeout**: no launcher, the request is abandoned after the timeout
//! 3. **Supersession**: a stale response for a replaced request is ignored
//! 4. **Independence**: correlators with distinct names never interfere
//! 5. **Runtime**: JSON-lines in, JSON-lines out

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use bridge_correlator::{
        CorrelatorConfig, CorrelatorConfigBuilder, DirectoryExchange, MalformedResponsePolicy,
    };
    use bridge_runtime::{BridgeRuntime, CorrelatorRegistry};
    use shared_bus::{
        AbandonReason, BridgeEvent, EventFilter, EventPublisher, EventTopic, InMemoryEventBus,
        ResponseCallback, Subscription,
    };

    use crate::integration::launcher::{next_event, SimulatedLauncher};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const POLL_INTERVAL: Duration = Duration::from_millis(50);
    const EVENT_WAIT: Duration = Duration::from_secs(5);

    type Calls = Arc<Mutex<Vec<(Value, Value)>>>;

    struct Bridge {
        _dir: TempDir,
        bus: Arc<InMemoryEventBus>,
        registry: CorrelatorRegistry<DirectoryExchange>,
        exchange: DirectoryExchange,
        launcher: SimulatedLauncher,
        outcomes: Subscription,
    }

    fn config(name: &str, timeout_secs: f64) -> CorrelatorConfig {
        CorrelatorConfigBuilder::new(name)
            .timeout_secs(timeout_secs)
            .poll_interval(POLL_INTERVAL)
            .build()
            .unwrap()
    }

    fn bridge(configs: Vec<CorrelatorConfig>) -> Bridge {
        let dir = TempDir::new().unwrap();
        let exchange = DirectoryExchange::new(dir.path());
        exchange.ensure_layout().unwrap();

        let bus = Arc::new(InMemoryEventBus::new());
        let registry = CorrelatorRegistry::new(bus.clone(), exchange.clone());
        for config in configs {
            registry.register(config).unwrap();
        }

        let outcomes = bus.subscribe(EventFilter::topics(vec![
            EventTopic::Response,
            EventTopic::Lifecycle,
        ]));

        Bridge {
            _dir: dir,
            bus,
            registry,
            launcher: SimulatedLauncher::new(exchange.clone()),
            exchange,
            outcomes,
        }
    }

    fn recorder() -> (Calls, ResponseCallback) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let callback = ResponseCallback::new(move |response, args| {
            sink.lock().push((response, args));
        });
        (calls, callback)
    }

    fn trigger(target: &str, data: Value, args: Value, callback: ResponseCallback) -> BridgeEvent {
        BridgeEvent::RequestTriggered {
            target: target.to_string(),
            data,
            args,
            callback: Some(callback),
        }
    }

    async fn next_outcome(bridge: &mut Bridge) -> BridgeEvent {
        next_event(&mut bridge.outcomes, EVENT_WAIT)
            .await
            .expect("timeout waiting for outcome")
    }

    // =============================================================================
    // DELIVERY
    // =============================================================================

    #[tokio::test]
    async fn test_response_delivered_to_callback_and_bus() {
        let mut bridge = bridge(vec![config("scores", 10.0)]);
        let responder = bridge.launcher.clone().spawn_auto_responder(|request| {
            json!({"score": 42, "chart": request["chart"].clone()})
        });

        let (calls, callback) = recorder();
        bridge
            .bus
            .publish(trigger(
                "scores",
                json!({"chart": "hard"}),
                json!({"row": 3}),
                callback,
            ))
            .await;

        match next_outcome(&mut bridge).await {
            BridgeEvent::ResponseDelivered {
                source,
                response,
                args,
                ..
            } => {
                assert_eq!(source, "scores");
                assert_eq!(response, json!({"score": 42, "chart": "hard"}));
                assert_eq!(args, json!({"row": 3}));
            }
            other => panic!("Expected ResponseDelivered, got {:?}", other),
        }

        let calls = calls.lock().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0["score"], 42);
        assert_eq!(calls[0].1, json!({"row": 3}));

        responder.abort();
    }

    #[tokio::test]
    async fn test_consumed_response_removed() {
        let consuming = CorrelatorConfigBuilder::new("scores")
            .poll_interval(POLL_INTERVAL)
            .remove_consumed_responses(true)
            .build()
            .unwrap();
        let mut bridge = bridge(vec![consuming]);

        let (_calls, callback) = recorder();
        bridge
            .bus
            .publish(trigger("scores", json!({}), Value::Null, callback))
            .await;
        let id = bridge
            .launcher
            .wait_for_new_request(&[], EVENT_WAIT)
            .await
            .unwrap();
        bridge.launcher.respond(&id, &json!({"ok": true})).unwrap();

        assert!(matches!(
            next_outcome(&mut bridge).await,
            BridgeEvent::ResponseDelivered { .. }
        ));
        let response_path = bridge.exchange.responses_dir().join(format!("{id}.json"));
        assert!(!response_path.exists());
    }

    // =============================================================================
    // TIMEOUT
    // =============================================================================

    #[tokio::test]
    async fn test_request_times_out_without_launcher() {
        let mut bridge = bridge(vec![config("scores", 1.0)]);
        let (calls, callback) = recorder();

        let started = Instant::now();
        bridge
            .bus
            .publish(trigger("scores", json!({}), Value::Null, callback))
            .await;

        match next_outcome(&mut bridge).await {
            BridgeEvent::RequestAbandoned { source, reason, .. } => {
                assert_eq!(source, "scores");
                assert_eq!(reason, AbandonReason::TimedOut);
            }
            other => panic!("Expected RequestAbandoned, got {:?}", other),
        }
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(calls.lock().is_empty());

        // The request file stays for the launcher to expire
        assert_eq!(bridge.launcher.pending_requests().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_response_abandoned_by_policy() {
        let strict = CorrelatorConfigBuilder::new("scores")
            .poll_interval(POLL_INTERVAL)
            .malformed_policy(MalformedResponsePolicy::Abandon)
            .build()
            .unwrap();
        let mut bridge = bridge(vec![strict]);

        let (calls, callback) = recorder();
        bridge
            .bus
            .publish(trigger("scores", json!({}), Value::Null, callback))
            .await;
        let id = bridge
            .launcher
            .wait_for_new_request(&[], EVENT_WAIT)
            .await
            .unwrap();
        bridge.launcher.respond_raw(&id, b"<html>502</html>").unwrap();

        match next_outcome(&mut bridge).await {
            BridgeEvent::RequestAbandoned {
                request_id, reason, ..
            } => {
                assert_eq!(request_id.to_string(), id);
                assert_eq!(reason, AbandonReason::MalformedResponse);
            }
            other => panic!("Expected RequestAbandoned, got {:?}", other),
        }
        assert!(calls.lock().is_empty());
    }

    // =============================================================================
    // SUPERSESSION
    // =============================================================================

    #[tokio::test]
    async fn test_superseded_response_never_delivered() {
        let mut bridge = bridge(vec![config("scores", 10.0)]);
        let (calls, first_callback) = recorder();
        let second_callback = {
            let sink = calls.clone();
            ResponseCallback::new(move |response, args| sink.lock().push((response, args)))
        };

        bridge
            .bus
            .publish(trigger("scores", json!({"n": 1}), json!(1), first_callback))
            .await;
        let first = bridge
            .launcher
            .wait_for_new_request(&[], EVENT_WAIT)
            .await
            .unwrap();

        bridge
            .bus
            .publish(trigger("scores", json!({"n": 2}), json!(2), second_callback))
            .await;
        let second = bridge
            .launcher
            .wait_for_new_request(std::slice::from_ref(&first), EVENT_WAIT)
            .await
            .unwrap();

        match next_outcome(&mut bridge).await {
            BridgeEvent::RequestAbandoned {
                request_id, reason, ..
            } => {
                assert_eq!(request_id.to_string(), first);
                assert_eq!(reason, AbandonReason::Superseded);
            }
            other => panic!("Expected RequestAbandoned, got {:?}", other),
        }

        // A late answer to the replaced request is never picked up
        bridge.launcher.respond(&first, &json!({"score": 1})).unwrap();
        assert!(next_event(&mut bridge.outcomes, POLL_INTERVAL * 4)
            .await
            .is_none());

        bridge.launcher.respond(&second, &json!({"score": 2})).unwrap();
        match next_outcome(&mut bridge).await {
            BridgeEvent::ResponseDelivered {
                request_id,
                response,
                args,
                ..
            } => {
                assert_eq!(request_id.to_string(), second);
                assert_eq!(response, json!({"score": 2}));
                assert_eq!(args, json!(2));
            }
            other => panic!("Expected ResponseDelivered, got {:?}", other),
        }

        assert_eq!(calls.lock().clone(), vec![(json!({"score": 2}), json!(2))]);
    }

    // =============================================================================
    // INDEPENDENCE
    // =============================================================================

    #[tokio::test]
    async fn test_correlators_are_independent() {
        let mut bridge = bridge(vec![config("scores", 10.0), config("rivals", 10.0)]);
        let responder = bridge
            .launcher
            .clone()
            .spawn_auto_responder(|request| json!({"echo": request.clone()}));

        let (calls, callback) = recorder();
        bridge
            .bus
            .publish(trigger("scores", json!({"who": "scores"}), json!("s"), callback.clone()))
            .await;
        bridge
            .bus
            .publish(trigger("rivals", json!({"who": "rivals"}), json!("r"), callback))
            .await;

        let mut sources = Vec::new();
        for _ in 0..2 {
            match next_outcome(&mut bridge).await {
                BridgeEvent::ResponseDelivered {
                    source, response, ..
                } => {
                    assert_eq!(response["echo"]["who"], source.as_str());
                    sources.push(source);
                }
                other => panic!("Expected ResponseDelivered, got {:?}", other),
            }
        }
        sources.sort();
        assert_eq!(sources, vec!["rivals", "scores"]);
        assert_eq!(calls.lock().len(), 2);

        for name in ["scores", "rivals"] {
            let snapshot = bridge.registry.metrics(name).unwrap();
            assert_eq!(snapshot.requests_issued, 1);
            assert_eq!(snapshot.responses_delivered, 1);
            assert_eq!(snapshot.requests_superseded, 0);
        }

        responder.abort();
        bridge.registry.shutdown().await;
    }

    // =============================================================================
    // RUNTIME (JSON-LINES)
    // =============================================================================

    #[tokio::test]
    async fn test_runtime_serves_json_lines_over_directory() {
        let dir = TempDir::new().unwrap();
        let exchange = DirectoryExchange::new(dir.path());
        exchange.ensure_layout().unwrap();

        let responder = SimulatedLauncher::new(exchange.clone()).spawn_auto_responder(|request| {
            json!({"rank": 1, "chart": request["chart"].clone()})
        });

        let runtime = BridgeRuntime::new(Arc::new(InMemoryEventBus::new()), exchange);
        runtime.register(config("scores", 10.0)).unwrap();

        let input: &[u8] = b"{\"target\":\"scores\",\"data\":{\"chart\":\"expert\"},\"args\":7}\n\
                             {\"target\":\"nobody\"}\n";
        let mut output = Vec::new();
        let snapshots = runtime
            .run(input, &mut output, std::future::pending())
            .await
            .unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "rejected");
        assert_eq!(lines[1]["event"], "delivered");
        assert_eq!(lines[1]["response"], json!({"rank": 1, "chart": "expert"}));
        assert_eq!(lines[1]["args"], json!(7));

        assert_eq!(snapshots[0].1.responses_delivered, 1);
        responder.abort();
    }
}
