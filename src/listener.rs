//! Listener role
//!
//! Subscribes to one topic filter with at-least-once delivery and logs every
//! message the broker hands over. Runs until a shutdown signal arrives.
//!
//! The failure policy is deliberately blunt: any error on the broker link
//! (initial connect, subscribe, or a disconnect after startup) is fatal and
//! surfaces to the process boundary. Callers that need resilience supervise
//! the process externally; there is no reconnection logic here. With
//! clean-session=false on the profile, a supervised restart under the same
//! client id picks up the QoS 1 messages the broker queued in the meantime.
//!
//! # Example
//!
//! ```rust,ignore
//! use mqtt_relay::listener::Listener;
//! use mqtt_relay::topics::TopicFilter;
//! use rumqttc::QoS;
//! use tokio::sync::broadcast;
//!
//! let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//! let mut listener = Listener::new(client, TopicFilter::new("game/#")?, QoS::AtLeastOnce);
//! let delivered = listener.run(shutdown_rx).await?;
//! println!("logged {} messages", delivered);
//! ```

use rumqttc::mqttbytes::v4::SubscribeReasonCode;
use rumqttc::QoS;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

use crate::error::RelayError;
use crate::mqtt::{MqttClient, MqttIncoming};
use crate::topics::TopicFilter;
use crate::util;

/// A message observed by the listener, as logged.
///
/// QoS 1 delivery is at-least-once: the same tuple may be observed more than
/// once and each observation is logged independently.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: u8,
    pub retain: bool,
}

/// Listener for logging messages delivered on a topic filter.
pub struct Listener {
    /// The MQTT client for broker communication.
    client: MqttClient,
    /// The topic filter to subscribe to.
    filter: TopicFilter,
    /// The Quality of Service level for the subscription.
    qos: QoS,
}

impl Listener {
    /// Creates a new Listener over a connected client.
    pub fn new(client: MqttClient, filter: TopicFilter, qos: QoS) -> Self {
        Self {
            client,
            filter,
            qos,
        }
    }

    /// Runs the listen loop until a shutdown signal is received.
    ///
    /// Subscribes to the configured filter, then logs topic and payload for
    /// every delivered message. On graceful shutdown the connection is closed
    /// with a bounded grace period so in-flight acknowledgments can flush.
    ///
    /// # Returns
    ///
    /// The number of messages delivered, or an error when the link fails.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError`] if the subscription is rejected, the connection
    /// is lost, or the broker disconnects. All of these are fatal; the
    /// process is expected to exit non-zero.
    pub async fn run(&mut self, shutdown: broadcast::Receiver<()>) -> Result<u64, RelayError> {
        self.run_with_tap(shutdown, None).await
    }

    /// Runs the listen loop, forwarding each observed message to an optional
    /// tap channel.
    ///
    /// The tap lets tests observe exactly what the listener logged without
    /// scraping log output; production callers pass `None` via [`Listener::run`].
    pub async fn run_with_tap(
        &mut self,
        mut shutdown: broadcast::Receiver<()>,
        tap: Option<mpsc::UnboundedSender<ReceivedMessage>>,
    ) -> Result<u64, RelayError> {
        self.client.subscribe(self.filter.as_str(), self.qos).await?;
        info!(filter = %self.filter, qos = util::qos_to_u8(self.qos), "subscribing");

        let mut message_count: u64 = 0;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("shutdown signal received, stopping listener");
                    break;
                }
                event_result = self.client.poll() => {
                    match event_result {
                        Ok(MqttIncoming::Publish { topic, payload, qos, retain }) => {
                            info!(
                                topic = %topic,
                                payload = %util::format_payload_preview(&payload),
                                "received message"
                            );
                            message_count += 1;
                            if let Some(ref tap) = tap {
                                let _ = tap.send(ReceivedMessage {
                                    topic,
                                    payload,
                                    qos: util::qos_to_u8(qos),
                                    retain,
                                });
                            }
                        }
                        Ok(MqttIncoming::ConnAck) => {
                            info!("connected to MQTT broker");
                        }
                        Ok(MqttIncoming::SubAck { return_codes }) => {
                            if subscription_rejected(&return_codes) {
                                error!(filter = %self.filter, "broker rejected the subscription");
                                return Err(RelayError::SubscriptionRejected(
                                    self.filter.as_str().to_string(),
                                ));
                            }
                            info!("subscription acknowledged");
                        }
                        Ok(MqttIncoming::Disconnect) => {
                            error!("broker closed the connection");
                            return Err(RelayError::LinkLost(
                                "broker closed the connection".to_string(),
                            ));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            // No reconnect here; the supervisor restarts us
                            error!("MQTT error: {}", e);
                            return Err(e);
                        }
                    }
                }
            }
        }

        let _ = tokio::time::timeout(
            tokio::time::Duration::from_secs(util::DISCONNECT_TIMEOUT_SECS),
            self.client.disconnect(),
        )
        .await;

        Ok(message_count)
    }
}

/// A SUBACK grants the subscription only when every return code is a
/// success grade.
fn subscription_rejected(return_codes: &[SubscribeReasonCode]) -> bool {
    return_codes
        .iter()
        .any(|code| matches!(code, SubscribeReasonCode::Failure))
}
