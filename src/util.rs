//! Utility functions for the MQTT Relay application.
//!
//! This module provides common helpers used across different modules,
//! including QoS conversions, client ID generation, and payload formatting
//! for log output.

use rumqttc::QoS;

/// Timeout in seconds for graceful MQTT disconnect operations.
pub const DISCONNECT_TIMEOUT_SECS: u64 = 2;

/// Default bound in seconds for the initial connect handshake.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default bound in seconds for waiting on a publish acknowledgment.
pub const DEFAULT_ACK_TIMEOUT_SECS: u64 = 10;

/// Convert QoS enum to u8 value.
///
/// # Returns
///
/// * `0` for `QoS::AtMostOnce`
/// * `1` for `QoS::AtLeastOnce`
/// * `2` for `QoS::ExactlyOnce`
#[must_use]
pub fn qos_to_u8(qos: QoS) -> u8 {
    match qos {
        QoS::AtMostOnce => 0,
        QoS::AtLeastOnce => 1,
        QoS::ExactlyOnce => 2,
    }
}

/// Convert u8 value to QoS enum.
///
/// Values other than 0, 1, or 2 fall back to at-least-once, the delivery
/// level the relay is built around.
#[must_use]
pub fn u8_to_qos(qos: u8) -> QoS {
    match qos {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

/// Generate a client ID from an optional string.
///
/// If `client_id` is `Some` and non-empty, returns a clone of the string.
/// Otherwise, generates a unique client ID using timestamp-based hashing.
/// The broker uses this identifier for session retention when the
/// clean-session flag is false, so long-lived deployments should pass an
/// explicit, stable ID.
#[must_use]
pub fn generate_client_id(client_id: &Option<String>) -> String {
    match client_id {
        Some(id) if !id.is_empty() => id.clone(),
        _ => {
            use std::time::{SystemTime, UNIX_EPOCH};
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos();
            let hash = timestamp ^ (timestamp >> 32);
            format!("mqtt-relay-{:08x}", hash as u32)
        }
    }
}

/// Format a payload for human-readable log output (truncated, hex for binary).
#[must_use]
pub fn format_payload_preview(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(s) if s.len() <= 120 => s.to_string(),
        Ok(s) => {
            // Byte 120 may land inside a multi-byte character; back up to
            // the nearest boundary so the slice cannot panic
            let mut end = 120;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &s[..end])
        }
        Err(_) if data.len() <= 60 => data
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => {
            let hex: String = data[..60]
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}...", hex)
        }
    }
}
