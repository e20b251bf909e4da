//! Integration tests for the listener role using an embedded broker.

use mqtt_relay::config::ConnectionProfile;
use mqtt_relay::listener::Listener;
use mqtt_relay::mqtt::MqttClient;
use mqtt_relay::publisher::Publisher;
use mqtt_relay::topics::TopicFilter;
use rumqttc::QoS;

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use super::common::start_broker;

fn profile(port: u16, id: &str) -> ConnectionProfile {
    ConnectionProfile::new("127.0.0.1".to_string(), port, id.to_string())
}

async fn publish_once(port: u16, id: &str, topic: &str, payload: &[u8]) {
    let client = MqttClient::connect(&profile(port, id));
    let publisher = Publisher::new(
        client,
        topic.to_string(),
        Duration::from_secs(5),
        Duration::from_secs(5),
    );
    let acked = publisher.run(payload).await.expect("publish failed");
    assert!(acked, "broker should acknowledge the publish");
}

/// A message published under a multi-level wildcard filter reaches the
/// listener with its topic and exact payload intact.
///
/// 1. Start embedded broker
/// 2. Listener subscribes to `a/#` with QoS 1
/// 3. Publish `{"type":0,"data":"x"}` to `a/b`
/// 4. The tap observes topic `a/b` and the exact payload string
#[tokio::test]
async fn test_listener_observes_matching_message() {
    let port = 18870;
    start_broker(port);

    let client = MqttClient::connect(&profile(port, "relay-listener"));
    let filter = TopicFilter::new("a/#").unwrap();
    let mut listener = Listener::new(client, filter, QoS::AtLeastOnce);

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let (tap_tx, mut tap_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move { listener.run_with_tap(shutdown_rx, Some(tap_tx)).await });

    // Let the subscription settle before publishing
    tokio::time::sleep(Duration::from_millis(500)).await;

    publish_once(port, "relay-sender", "a/b", br#"{"type":0,"data":"x"}"#).await;

    let msg = timeout(Duration::from_secs(5), tap_rx.recv())
        .await
        .expect("no message within 5 seconds")
        .expect("tap channel closed");

    assert_eq!(msg.topic, "a/b");
    assert_eq!(msg.payload, br#"{"type":0,"data":"x"}"#);
    assert_eq!(msg.qos, 1);

    let _ = shutdown_tx.send(());
    let delivered = timeout(Duration::from_secs(5), handle)
        .await
        .expect("listener timed out")
        .expect("listener task panicked")
        .expect("listener returned error");
    assert!(delivered >= 1, "at least one delivery must be counted");
}

/// Two identical publishes are two independent deliveries, not one merged
/// one: at-least-once has no dedup across separate publish attempts.
#[tokio::test]
async fn test_identical_publishes_delivered_independently() {
    let port = 18871;
    start_broker(port);

    let client = MqttClient::connect(&profile(port, "relay-listener-2"));
    let filter = TopicFilter::new("game/#").unwrap();
    let mut listener = Listener::new(client, filter, QoS::AtLeastOnce);

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let (tap_tx, mut tap_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move { listener.run_with_tap(shutdown_rx, Some(tap_tx)).await });

    tokio::time::sleep(Duration::from_millis(500)).await;

    let payload = br#"{"type":1,"data":{"cid":-1,"team":-2,"message":"Hello, World!"}}"#;
    publish_once(port, "relay-sender-a", "game/FMS/response", payload).await;
    publish_once(port, "relay-sender-b", "game/FMS/response", payload).await;

    for _ in 0..2 {
        let msg = timeout(Duration::from_secs(5), tap_rx.recv())
            .await
            .expect("missing delivery")
            .expect("tap channel closed");
        assert_eq!(msg.topic, "game/FMS/response");
        assert_eq!(msg.payload, payload);
    }

    let _ = shutdown_tx.send(());
    let delivered = timeout(Duration::from_secs(5), handle)
        .await
        .expect("listener timed out")
        .expect("listener task panicked")
        .expect("listener returned error");
    assert!(delivered >= 2);
}

/// Losing the broker link after startup fails the listener promptly instead
/// of reconnecting or hanging. The embedded broker thread cannot be stopped
/// once started, so the broker here is a bare TCP endpoint that completes the
/// handshake and then drops the connection.
#[tokio::test]
async fn test_listener_fails_after_link_loss() {
    let port = 18873;
    let server = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("bind test endpoint");
    let server_task = tokio::spawn(async move {
        let (mut socket, _) = server.accept().await.expect("accept failed");
        let mut buf = [0u8; 1024];
        // Consume the CONNECT packet, answer with a plain CONNACK
        // (session_present=0, return code 0), then close the link
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(&[0x20, 0x02, 0x00, 0x00])
            .await
            .expect("write CONNACK");
        socket.flush().await.expect("flush CONNACK");
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(socket);
    });

    let client = MqttClient::connect(&profile(port, "relay-listener-4"));
    let filter = TopicFilter::new("game/#").unwrap();
    let mut listener = Listener::new(client, filter, QoS::AtLeastOnce);

    let (_shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let result = timeout(Duration::from_secs(5), listener.run(shutdown_rx))
        .await
        .expect("listener must fail within the grace period, not hang");

    assert!(result.is_err(), "link loss after startup must be an error");
    let _ = server_task.await;
}

/// Messages outside the filter are not delivered to the listener.
#[tokio::test]
async fn test_listener_ignores_non_matching_topic() {
    let port = 18872;
    start_broker(port);

    let client = MqttClient::connect(&profile(port, "relay-listener-3"));
    let filter = TopicFilter::new("game/+/response").unwrap();
    let mut listener = Listener::new(client, filter, QoS::AtLeastOnce);

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let (tap_tx, mut tap_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move { listener.run_with_tap(shutdown_rx, Some(tap_tx)).await });

    tokio::time::sleep(Duration::from_millis(500)).await;

    publish_once(port, "relay-sender-c", "other/topic", b"{\"type\":0,\"data\":\"n\"}").await;
    publish_once(
        port,
        "relay-sender-d",
        "game/FMS/response",
        b"{\"type\":0,\"data\":\"y\"}",
    )
    .await;

    // The matching message arrives; the non-matching one never does
    let msg = timeout(Duration::from_secs(5), tap_rx.recv())
        .await
        .expect("missing delivery")
        .expect("tap channel closed");
    assert_eq!(msg.topic, "game/FMS/response");

    assert!(
        tap_rx.try_recv().is_err(),
        "non-matching topic must not be delivered"
    );

    let _ = shutdown_tx.send(());
    let delivered = timeout(Duration::from_secs(5), handle)
        .await
        .expect("listener timed out")
        .expect("listener task panicked")
        .expect("listener returned error");
    assert_eq!(delivered, 1);
}
