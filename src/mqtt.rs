//! MQTT client module
//!
//! Wraps the `rumqttc` client with connection management for the relay.
//!
//! All MQTT semantics (handshake, QoS delivery, keep-alive, topic matching)
//! are delegated to `rumqttc`; this module only builds the options from a
//! [`ConnectionProfile`] and normalizes the event stream into the small set
//! of events the relay roles care about.

use crate::config::ConnectionProfile;
use crate::error::RelayError;
use rumqttc::mqttbytes::v4::SubscribeReasonCode;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Keep-alive interval for the broker link.
const KEEP_ALIVE_SECS: u64 = 30;

/// Request channel capacity between the client handle and the event loop.
const CHANNEL_CAPACITY: usize = 64;

/// Incoming event normalized from the rumqttc event stream.
#[derive(Debug)]
pub enum MqttIncoming {
    /// An application message delivered on a subscribed topic.
    Publish {
        topic: String,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    },
    /// The broker accepted the connection.
    ConnAck,
    /// The broker answered a subscription request. The return codes must be
    /// inspected: rumqttc passes a SUBACK through even when every code is a
    /// failure.
    SubAck {
        return_codes: Vec<SubscribeReasonCode>,
    },
    /// The broker acknowledged a QoS 1 publish.
    PubAck,
    /// The broker initiated a disconnect.
    Disconnect,
    /// Any other protocol event (pings, outgoing packets, ...).
    Other,
}

/// MQTT client wrapper around rumqttc.
///
/// The client is created from an immutable [`ConnectionProfile`] and owned by
/// a single process for its entire lifetime. The event loop lives behind a
/// mutex so the same handle can both issue requests and poll for events.
///
/// # Example
///
/// ```rust,ignore
/// use mqtt_relay::config::ConnectionProfile;
/// use mqtt_relay::mqtt::MqttClient;
/// use rumqttc::QoS;
///
/// let profile = ConnectionProfile::new("localhost".to_string(), 1883, "relay".to_string());
/// let client = MqttClient::connect(&profile);
/// client.subscribe("game/#", QoS::AtLeastOnce).await?;
/// ```
pub struct MqttClient {
    /// The async MQTT client for sending commands
    client: AsyncClient,
    /// The event loop for receiving events (wrapped in Mutex for interior mutability)
    eventloop: Arc<Mutex<EventLoop>>,
}

impl MqttClient {
    /// Create a client for the given connection profile.
    ///
    /// The actual network connection is established lazily by the event loop;
    /// callers that need to know the handshake succeeded should follow up
    /// with [`MqttClient::wait_for_connack`].
    pub fn connect(profile: &ConnectionProfile) -> Self {
        let mut mqtt_options =
            MqttOptions::new(&profile.client_id, &profile.host, profile.port);

        mqtt_options.set_keep_alive(Duration::from_secs(KEEP_ALIVE_SECS));

        // clean_session=false asks the broker to retain undelivered QoS 1
        // messages for this client id across reconnects
        mqtt_options.set_clean_session(profile.clean_session);

        if let (Some(username), Some(password)) = (&profile.username, &profile.password) {
            mqtt_options.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(mqtt_options, CHANNEL_CAPACITY);

        Self {
            client,
            eventloop: Arc::new(Mutex::new(eventloop)),
        }
    }

    /// Subscribe to a topic filter with the specified QoS.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Client`] if the subscribe request cannot be
    /// issued.
    pub async fn subscribe(&self, filter: &str, qos: QoS) -> Result<(), RelayError> {
        self.client.subscribe(filter, qos).await?;
        Ok(())
    }

    /// Publish a message to an exact topic.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Client`] if the publish request cannot be issued.
    pub async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), RelayError> {
        self.client.publish(topic, qos, retain, payload).await?;
        Ok(())
    }

    /// Poll for the next event from the broker.
    ///
    /// This method must be called in a loop to process incoming messages and
    /// keep the connection alive.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Connection`] when the link fails; the relay
    /// treats this as fatal.
    pub async fn poll(&self) -> Result<MqttIncoming, RelayError> {
        let mut eventloop = self.eventloop.lock().await;
        let event = eventloop.poll().await?;
        Ok(Self::convert_event(event))
    }

    /// Drive the event loop until the broker accepts the connection.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Timeout`] if no CONNACK arrives within
    /// `timeout`, [`RelayError::LinkLost`] if the broker disconnects during
    /// the handshake, or [`RelayError::Connection`] on network/auth failure.
    pub async fn wait_for_connack(&self, timeout: Duration) -> Result<(), RelayError> {
        let wait = async {
            loop {
                match self.poll().await? {
                    MqttIncoming::ConnAck => return Ok(()),
                    MqttIncoming::Disconnect => {
                        return Err(RelayError::LinkLost(
                            "broker disconnected during handshake".to_string(),
                        ))
                    }
                    _ => {}
                }
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| RelayError::Timeout(format!("no CONNACK within {:?}", timeout)))?
    }

    /// Disconnect from the broker.
    ///
    /// Sends a DISCONNECT packet; the caller bounds the wait with a grace
    /// period.
    pub async fn disconnect(&self) -> Result<(), RelayError> {
        self.client.disconnect().await?;
        Ok(())
    }

    fn convert_event(event: Event) -> MqttIncoming {
        match event {
            Event::Incoming(Packet::Publish(p)) => MqttIncoming::Publish {
                topic: p.topic,
                payload: p.payload.to_vec(),
                qos: p.qos,
                retain: p.retain,
            },
            Event::Incoming(Packet::ConnAck(_)) => MqttIncoming::ConnAck,
            Event::Incoming(Packet::SubAck(s)) => MqttIncoming::SubAck {
                return_codes: s.return_codes,
            },
            Event::Incoming(Packet::PubAck(_)) => MqttIncoming::PubAck,
            Event::Incoming(Packet::Disconnect) => MqttIncoming::Disconnect,
            _ => MqttIncoming::Other,
        }
    }
}
