//! CLI argument parsing module
//!
//! Handles command-line argument parsing using `clap` derive macros.
//! This module defines the `Mode` enum for the two relay roles and the `Args`
//! struct containing all CLI arguments with validation logic.
//!
//! Argument validation only checks what can be decided from the flags alone;
//! cross-checking against the optional profile file happens during settings
//! resolution in the `config` module.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::util;

/// Operation mode for the MQTT Relay.
///
/// - **Listen**: subscribe to a topic filter and log every delivered message
/// - **Publish**: publish one JSON message, wait for the acknowledgment, exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Subscribe to a topic filter and log received messages
    Listen,
    /// Publish a single message and wait for the broker acknowledgment
    Publish,
}

/// Command-line arguments for the MQTT Relay.
///
/// Use the `validate()` method after parsing to ensure argument combinations
/// are valid.
#[derive(Parser, Debug)]
#[command(name = "mqtt-relay")]
#[command(about = "Relay messages between an MQTT broker and a game-server integration")]
#[command(version)]
pub struct Args {
    /// Operation mode: listen or publish
    #[arg(long, value_enum)]
    pub mode: Mode,

    /// MQTT broker address (required unless the profile file sets brokerAddress)
    #[arg(long)]
    pub host: Option<String>,

    /// MQTT broker port
    #[arg(long, default_value = "1883")]
    pub port: u16,

    /// MQTT client ID (generated when omitted; session retention is keyed on it)
    #[arg(long)]
    pub client_id: Option<String>,

    /// MQTT username
    #[arg(long)]
    pub username: Option<String>,

    /// MQTT password
    #[arg(long)]
    pub password: Option<String>,

    /// Topic filter to subscribe (listen) or exact topic to publish to
    #[arg(short = 't', long)]
    pub topic: Option<String>,

    /// QoS level (0, 1, or 2)
    #[arg(long, default_value = "1")]
    pub qos: u8,

    /// Clean-session flag; false keeps undelivered QoS 1 messages across reconnects
    #[arg(long)]
    pub clean_session: Option<bool>,

    /// JSON message body to publish (defaults to the built-in test message)
    #[arg(long)]
    pub message: Option<String>,

    /// Path to a JSON connection profile file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bound in seconds for the initial connect handshake
    #[arg(long, default_value_t = util::DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout: u64,

    /// Bound in seconds for the publish acknowledgment wait
    #[arg(long, default_value_t = util::DEFAULT_ACK_TIMEOUT_SECS)]
    pub ack_timeout: u64,
}

impl Args {
    /// Validate argument combinations.
    ///
    /// Checks that:
    /// - QoS is 0, 1, or 2
    /// - `--message` is only used in publish mode
    /// - timeouts are non-zero
    ///
    /// # Returns
    ///
    /// - `Ok(())` if the argument combination is valid
    /// - `Err(String)` with a descriptive error message if validation fails
    pub fn validate(&self) -> Result<(), String> {
        if self.qos > 2 {
            return Err(format!("Invalid QoS: {}. Must be 0, 1, or 2.", self.qos));
        }

        if self.mode == Mode::Listen && self.message.is_some() {
            return Err("--message is only valid in publish mode".to_string());
        }

        if self.connect_timeout == 0 {
            return Err("--connect-timeout must be greater than zero".to_string());
        }

        if self.ack_timeout == 0 {
            return Err("--ack-timeout must be greater than zero".to_string());
        }

        Ok(())
    }
}
