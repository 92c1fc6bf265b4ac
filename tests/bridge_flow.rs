//! End-to-end message handling against mock transport and executor.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{Notify, Semaphore};

use common::{wait_for, Harness, MockConnector, RecordingExecutor, BROKER, PEER};
use mqtt_http_bridge::config::TransportOptions;
use mqtt_http_bridge::http::{ExecutorError, HttpExecutor, HttpResponse, RequestDescriptor};
use mqtt_http_bridge::routing::route::BoxError;
use mqtt_http_bridge::{Bridge, BridgeError, HttpMethod, ResponseCallback, RouteOptions};

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_get_route_relays_response() {
    let harness = Harness::new(RecordingExecutor::responding(200, r#"{"id":2,"title":"quidem"}"#));
    harness.connect().await;
    harness
        .bridge
        .add_route("cucumber", "http://svc.test/albums/2", RouteOptions::new())
        .await
        .unwrap();

    harness.connector.message("cucumber", b"");

    let client = harness.client();
    assert!(wait_for(|| client.published().len() == 1, WAIT).await);

    let requests = harness.executor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(requests[0].url, "http://svc.test/albums/2");
    assert_eq!(requests[0].body, None);

    let (topic, payload) = &client.published()[0];
    assert_eq!(topic, "cucumber/response");
    let body: Value = serde_json::from_slice(payload).unwrap();
    assert_eq!(body, json!({"id": 2, "title": "quidem"}));
}

#[tokio::test]
async fn test_post_route_sends_body_and_publishes_nothing() {
    let harness = Harness::new(RecordingExecutor::responding(201, r#"{"id":101}"#));
    harness.connect().await;
    let options = RouteOptions::new().method(HttpMethod::Post);
    harness
        .bridge
        .add_route("orders", "http://svc.test/orders", options)
        .await
        .unwrap();

    harness.connector.message("orders", br#"{"item":"widget","qty":3}"#);

    let executor = harness.executor.clone();
    assert!(wait_for(|| executor.requests().len() == 1, WAIT).await);
    let request = &executor.requests()[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.body, Some(json!({"item": "widget", "qty": 3})));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness.client().published().is_empty());
}

#[tokio::test]
async fn test_unrouted_topic_makes_no_request() {
    let harness = Harness::new(RecordingExecutor::default());
    harness.connect().await;

    harness.bridge.handle_message("nobody/listens", b"{}").await;

    assert!(harness.executor.requests().is_empty());
    assert!(harness.client().published().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_dropped() {
    let harness = Harness::new(RecordingExecutor::default());
    harness.connect().await;
    for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete] {
        let topic = format!("orders/{}", method.as_str().to_lowercase());
        harness
            .bridge
            .add_route(&topic, "http://svc.test/orders", RouteOptions::new().method(method))
            .await
            .unwrap();
        harness.bridge.handle_message(&topic, b"not json").await;
        harness.bridge.handle_message(&topic, b"").await;
    }

    assert!(harness.executor.requests().is_empty());
}

#[tokio::test]
async fn test_dynamic_route_takes_request_from_payload() {
    let harness = Harness::new(RecordingExecutor::responding(200, r#"{"ok":true}"#));
    harness.connect().await;
    harness
        .bridge
        .add_route("dyn", "", RouteOptions::new().dynamic(true))
        .await
        .unwrap();

    harness
        .bridge
        .handle_message("dyn", br#"{"method":"put","url":"http://svc.test/posts/1","data":{"title":"x"}}"#)
        .await;
    harness
        .bridge
        .handle_message("dyn", br#"{"method":"GET","url":"http://svc.test/posts/1","data":{"ignored":1}}"#)
        .await;
    harness.bridge.handle_message("dyn", br#"{"url":"http://svc.test/posts/1"}"#).await;

    let requests = harness.executor.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, HttpMethod::Put);
    assert_eq!(requests[0].body, Some(json!({"title": "x"})));
    assert_eq!(requests[1].method, HttpMethod::Get);
    assert_eq!(requests[1].body, None);

    // only the GET is relayed
    let published = harness.client().published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "dyn/response");
}

#[tokio::test]
async fn test_custom_callback_replaces_relay() {
    let harness = Harness::new(RecordingExecutor::responding(200, "[1,2,3]"));
    harness.connect().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback = ResponseCallback::custom(move |client, topic, body| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push((topic.clone(), body));
            client.publish(&format!("{}/custom", topic), b"done".to_vec()).await?;
            Ok::<_, BoxError>(())
        }
    });
    let options = RouteOptions::new().response_topic("stats/out").callback(callback);
    harness.bridge.add_route("stats", "http://svc.test/stats", options).await.unwrap();

    harness.bridge.handle_message("stats", b"").await;

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen, vec![("stats/out".to_string(), json!([1, 2, 3]))]);
    assert_eq!(
        harness.client().published(),
        vec![("stats/out/custom".to_string(), b"done".to_vec())]
    );
}

async fn explode() -> Result<(), BoxError> {
    panic!("callback bug")
}

#[tokio::test]
async fn test_failing_callbacks_do_not_stop_the_bridge() {
    let harness = Harness::new(RecordingExecutor::default());
    harness.connect().await;

    let failing = ResponseCallback::custom(|_, _, _| async { Err::<(), BoxError>("downstream full".into()) });
    let panicking = ResponseCallback::custom(|_, _, _| explode());
    let bridge = &harness.bridge;
    bridge.add_route("a", "http://svc.test/a", RouteOptions::new().callback(failing)).await.unwrap();
    bridge.add_route("b", "http://svc.test/b", RouteOptions::new().callback(panicking)).await.unwrap();
    bridge.add_route("c", "http://svc.test/c", RouteOptions::new()).await.unwrap();

    harness.connector.message("a", b"");
    harness.connector.message("b", b"");
    harness.connector.message("c", b"");

    let executor = harness.executor.clone();
    assert!(wait_for(|| executor.requests().len() == 3, WAIT).await);
    let client = harness.client();
    assert!(wait_for(|| !client.published().is_empty(), WAIT).await);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let published = client.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "c/response");
}

#[tokio::test]
async fn test_non_success_status_is_not_relayed() {
    let harness = Harness::new(RecordingExecutor::responding(500, r#"{"error":"boom"}"#));
    harness.connect().await;
    harness.bridge.add_route("cucumber", "http://svc.test/albums/2", RouteOptions::new()).await.unwrap();

    harness.bridge.handle_message("cucumber", b"").await;

    assert_eq!(harness.executor.requests().len(), 1);
    assert!(harness.client().published().is_empty());
}

#[tokio::test]
async fn test_add_route_subscribes_and_remove_unsubscribes() {
    let harness = Harness::new(RecordingExecutor::default());
    harness.connect().await;

    harness.bridge.add_route("sensors/temp", "http://svc.test/t", RouteOptions::new()).await.unwrap();
    assert_eq!(harness.client().subscribed(), vec!["sensors/temp".to_string()]);
    assert!(harness.bridge.get_routes().contains_key("sensors/temp"));

    let removed = harness.bridge.remove_route("sensors/temp").await.unwrap();
    assert_eq!(removed.target_url, "http://svc.test/t");
    assert_eq!(harness.client().unsubscribed(), vec!["sensors/temp".to_string()]);
    assert!(harness.bridge.get_routes().is_empty());
    assert!(harness.bridge.remove_route("sensors/temp").await.is_none());

    harness.bridge.handle_message("sensors/temp", b"").await;
    assert!(harness.executor.requests().is_empty());
}

#[tokio::test]
async fn test_add_route_rejects_empty_topic() {
    let harness = Harness::new(RecordingExecutor::default());
    let err = harness.bridge.add_route("", "http://svc.test", RouteOptions::new()).await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidRoute(_)));
    assert!(harness.client().subscribed().is_empty());
}

#[tokio::test]
async fn test_connect_failure_is_returned() {
    let bridge = Bridge::new(Arc::new(MockConnector::refusing()), Arc::new(RecordingExecutor::default()));
    let err = bridge.connect(BROKER, PEER, &TransportOptions::default()).await.unwrap_err();
    assert!(matches!(err, BridgeError::TransportConnect { .. }));
    assert!(!bridge.status().transport_connected);
}

#[tokio::test]
async fn test_unreachable_peer_is_not_fatal() {
    let harness = Harness::new(RecordingExecutor::unreachable_peer());
    harness.connect().await;

    let status = harness.bridge.status();
    assert!(status.transport_connected);
    assert!(!status.peer_connected);
    assert!(!status.is_ready());

    harness.bridge.add_route("a", "http://svc.test/a", RouteOptions::new()).await.unwrap();
    harness.bridge.handle_message("a", b"").await;
    assert_eq!(harness.executor.requests().len(), 1);
}

#[tokio::test]
async fn test_wait_until_connected_times_out_without_broker() {
    let harness = Harness::new(RecordingExecutor::default());
    harness.bridge.connect(BROKER, PEER, &TransportOptions::default()).await.unwrap();
    assert!(!harness.bridge.wait_until_connected(Some(Duration::from_millis(30))).await);
    assert!(harness.bridge.status().peer_connected);
}

/// Holds every request until the test opens the gate.
struct GatedExecutor {
    gate: Semaphore,
    started: Notify,
}

#[async_trait]
impl HttpExecutor for GatedExecutor {
    async fn execute(&self, _request: &RequestDescriptor) -> Result<HttpResponse, ExecutorError> {
        self.started.notify_one();
        let _permit = self.gate.acquire().await.map_err(|e| ExecutorError::Transport(e.to_string()))?;
        Ok(HttpResponse::new(200, r#"{"id":7}"#))
    }

    async fn probe(&self, _base_address: &str) -> Result<(), ExecutorError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_inflight_request_uses_route_captured_at_dispatch() {
    let connector = Arc::new(MockConnector::default());
    let executor = Arc::new(GatedExecutor {
        gate: Semaphore::new(0),
        started: Notify::new(),
    });
    let bridge = Bridge::new(connector.clone(), executor.clone());
    bridge.connect(BROKER, PEER, &TransportOptions::default()).await.unwrap();
    connector.emit(mqtt_http_bridge::transport::TransportEvent::Connected);
    assert!(bridge.wait_until_connected(Some(WAIT)).await);

    let options = RouteOptions::new().response_topic("a/out");
    bridge.add_route("a", "http://svc.test/a", options).await.unwrap();

    let inflight = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.handle_message("a", b"").await })
    };
    tokio::time::timeout(WAIT, executor.started.notified()).await.unwrap();

    assert!(bridge.remove_route("a").await.is_some());
    assert!(bridge.get_routes().is_empty());

    executor.gate.add_permits(1);
    inflight.await.unwrap();

    let published = connector.client.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "a/out");
    assert_eq!(serde_json::from_slice::<Value>(&published[0].1).unwrap(), json!({"id": 7}));
}
