//! Publisher role
//!
//! Connects, publishes one message with at-least-once delivery, waits for
//! the broker's acknowledgment, and disconnects.
//!
//! Connection failure is fatal and bounded by the connect timeout. A missing
//! acknowledgment after a successful publish is reported but not retried:
//! the attempt has already been made, and issuing it again would be a second
//! delivery, not a retry of the first.

use rumqttc::QoS;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::RelayError;
use crate::mqtt::{MqttClient, MqttIncoming};
use crate::util;

/// One-shot publisher for a single QoS 1 message.
///
/// # Example
///
/// ```rust,ignore
/// use mqtt_relay::publisher::Publisher;
///
/// let publisher = Publisher::new(client, "game/FMS/response".to_string(), connect_timeout, ack_timeout);
/// let acked = publisher.run(payload.as_bytes()).await?;
/// ```
pub struct Publisher {
    /// The MQTT client for broker communication.
    client: MqttClient,
    /// The exact destination topic.
    topic: String,
    /// Bound on the initial connect handshake.
    connect_timeout: Duration,
    /// Bound on the acknowledgment wait.
    ack_timeout: Duration,
}

impl Publisher {
    /// Creates a new Publisher over a connected client.
    pub fn new(
        client: MqttClient,
        topic: String,
        connect_timeout: Duration,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            client,
            topic,
            connect_timeout,
            ack_timeout,
        }
    }

    /// Publish `payload` once with QoS 1, retain=false.
    ///
    /// Blocks until the broker acknowledges the delivery or the ack timeout
    /// expires, then disconnects with a bounded grace period.
    ///
    /// # Returns
    ///
    /// `Ok(true)` when the acknowledgment was observed, `Ok(false)` when the
    /// publish went out but no acknowledgment arrived in time. The missing
    /// ack is logged; no retry is issued.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError`] when the connection cannot be established
    /// within the connect timeout or the publish request itself fails.
    pub async fn run(&self, payload: &[u8]) -> Result<bool, RelayError> {
        self.client.wait_for_connack(self.connect_timeout).await?;
        info!("connected to MQTT broker");

        self.client
            .publish(&self.topic, payload, QoS::AtLeastOnce, false)
            .await?;
        info!(
            topic = %self.topic,
            payload = %util::format_payload_preview(payload),
            "published message"
        );

        let acked = match tokio::time::timeout(self.ack_timeout, self.wait_for_ack()).await {
            Ok(Ok(())) => {
                info!("delivery acknowledged by broker");
                true
            }
            Ok(Err(e)) => {
                // The publish already left; report the broken ack path
                // without failing the completed attempt
                warn!("link failed while waiting for acknowledgment: {}", e);
                false
            }
            Err(_) => {
                warn!(
                    "no acknowledgment within {:?}, giving up without retry",
                    self.ack_timeout
                );
                false
            }
        };

        let _ = tokio::time::timeout(
            Duration::from_secs(util::DISCONNECT_TIMEOUT_SECS),
            self.client.disconnect(),
        )
        .await;

        Ok(acked)
    }

    /// Drive the event loop until the PUBACK for the outstanding publish
    /// arrives. Only one publish is ever in flight, so any PUBACK is ours.
    async fn wait_for_ack(&self) -> Result<(), RelayError> {
        loop {
            match self.client.poll().await? {
                MqttIncoming::PubAck => return Ok(()),
                MqttIncoming::Disconnect => {
                    return Err(RelayError::LinkLost(
                        "broker closed the connection before acknowledging".to_string(),
                    ))
                }
                _ => {}
            }
        }
    }
}
