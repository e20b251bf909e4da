//! Error module
//!
//! Defines custom error types using `thiserror` for the MQTT Relay application.
//! This module provides a unified error type that wraps all possible error sources
//! and implements the `From` trait for automatic conversion from underlying error types.

use thiserror::Error;

/// The main error type for the MQTT Relay application.
///
/// This enum represents all possible errors that can occur during the operation
/// of the relay, including connection errors, client operation errors, and
/// configuration errors.
///
/// # Error Categories
///
/// - **Connection errors**: failure to establish or keep the broker link
///   (`Connection`, `LinkLost`, `Timeout`)
/// - **Client errors**: MQTT operations rejected by the client or broker
///   (`Client`, covers subscribe and publish requests)
/// - **Configuration errors**: invalid arguments, profile files, or payloads
///   (`InvalidArgument`, `Io`, `Json`)
#[derive(Error, Debug)]
pub enum RelayError {
    /// MQTT connection error from the rumqttc client.
    ///
    /// This error occurs when the MQTT client fails to establish or maintain
    /// a connection to the broker, including network and authentication failures.
    ///
    /// Note: The error is boxed to reduce the size of the Result type,
    /// as rumqttc::ConnectionError is 144 bytes.
    #[error("MQTT connection error: {0}")]
    Connection(#[source] Box<rumqttc::ConnectionError>),

    /// MQTT client operation error from the rumqttc client.
    ///
    /// This error occurs when an MQTT client request (publish, subscribe,
    /// disconnect) cannot be queued or is rejected.
    #[error("MQTT client error: {0}")]
    Client(#[source] Box<rumqttc::ClientError>),

    /// The broker answered the subscribe request with a failure code.
    ///
    /// rumqttc does not treat a failed SUBACK as an error, so the relay
    /// checks the return codes itself; a rejected subscription would
    /// otherwise leave the listener polling a topic it never receives.
    #[error("Subscription rejected by broker: {0}")]
    SubscriptionRejected(String),

    /// The broker closed the link after a successful startup.
    ///
    /// The relay never reconnects on its own; this error surfaces to the
    /// process boundary so an external supervisor can restart it.
    #[error("Broker link lost: {0}")]
    LinkLost(String),

    /// A bounded wait (connect or acknowledgment) expired.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// General I/O error.
    ///
    /// This error occurs for file system operations like reading the
    /// connection profile file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    ///
    /// This error occurs when parsing the profile file or a message payload
    /// fails due to invalid JSON syntax or structure.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid command-line argument or profile value.
    ///
    /// This error occurs when arguments are invalid or have incompatible
    /// combinations (e.g., a wildcard in a publish topic).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

// Manual From implementations for boxed error types
impl From<rumqttc::ConnectionError> for RelayError {
    fn from(err: rumqttc::ConnectionError) -> Self {
        RelayError::Connection(Box::new(err))
    }
}

impl From<rumqttc::ClientError> for RelayError {
    fn from(err: rumqttc::ClientError) -> Self {
        RelayError::Client(Box::new(err))
    }
}
