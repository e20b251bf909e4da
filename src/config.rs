//! Connection profile and settings resolution.
//!
//! The relay is configured from an optional JSON profile file plus CLI flags;
//! flags win over file values. The profile file uses the field names the
//! deployment tooling already emits:
//!
//! ```json
//! {
//!     "brokerAddress": "tcp://localhost:1883",
//!     "clientID": "game-consumer",
//!     "username": "admin",
//!     "password": "secret",
//!     "topic": "game/#",
//!     "cleanSession": false
//! }
//! ```
//!
//! Resolution happens once at startup; the resulting [`RelaySettings`] are
//! immutable for the process lifetime and owned exclusively by the process.

use crate::cli::{Args, Mode};
use crate::error::RelayError;
use crate::message;
use crate::topics::{self, TopicFilter};
use crate::util;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Default MQTT broker port.
pub const DEFAULT_PORT: u16 = 1883;

/// Everything needed to establish a broker connection.
///
/// Constructed once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ConnectionProfile {
    /// The hostname or IP address of the MQTT broker
    pub host: String,

    /// The port number of the MQTT broker
    pub port: u16,

    /// The client identifier presented to the broker.
    /// The broker keys session retention on this value.
    pub client_id: String,

    /// Optional username for broker authentication
    pub username: Option<String>,

    /// Optional password for broker authentication
    pub password: Option<String>,

    /// Clean-session flag. When false the broker retains undelivered QoS 1
    /// messages for this client id across reconnects.
    pub clean_session: bool,
}

impl ConnectionProfile {
    /// Creates a new profile with the given endpoint and client id.
    ///
    /// Credentials are unset and the session is clean by default.
    pub fn new(host: String, port: u16, client_id: String) -> Self {
        Self {
            host,
            port,
            client_id,
            username: None,
            password: None,
            clean_session: true,
        }
    }

    /// Sets the authentication credentials for the connection.
    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    /// Returns true if authentication credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

/// On-disk JSON profile. All fields are optional; CLI flags fill the gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ProfileFile {
    broker_address: Option<String>,
    #[serde(rename = "clientID")]
    client_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
    topic: Option<String>,
    clean_session: Option<bool>,
}

impl ProfileFile {
    fn load(path: &Path) -> Result<Self, RelayError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Fully resolved, immutable settings for one relay process.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// The connection profile for the broker link.
    pub profile: ConnectionProfile,
    /// Subscription filter (listen mode) or publish destination (publish mode).
    pub topic: String,
    /// Publish payload; `None` means the built-in default message.
    pub message: Option<String>,
    /// Bound on the initial connect handshake.
    pub connect_timeout: Duration,
    /// Bound on the wait for a publish acknowledgment.
    pub ack_timeout: Duration,
}

impl RelaySettings {
    /// Resolve settings from CLI arguments and the optional profile file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] / [`RelayError::Json`] when the profile
    /// file cannot be read or parsed, and [`RelayError::InvalidArgument`]
    /// when the merged settings are incomplete or inconsistent (no broker
    /// address, no topic, a wildcard publish topic, lone username/password,
    /// or a malformed `--message`).
    pub fn resolve(args: &Args) -> Result<Self, RelayError> {
        let file = match &args.config {
            Some(path) => ProfileFile::load(path)?,
            None => ProfileFile::default(),
        };

        // CLI endpoint wins as a unit: mixing a CLI host with a file port
        // would silently target the wrong broker
        let (host, port) = match &args.host {
            Some(host) => (host.clone(), args.port),
            None => {
                let address = file.broker_address.as_deref().ok_or_else(|| {
                    RelayError::InvalidArgument(
                        "no broker address: pass --host or set brokerAddress in the profile"
                            .to_string(),
                    )
                })?;
                let (host, file_port) = parse_broker_address(address)?;
                (host, file_port.unwrap_or(args.port))
            }
        };

        let client_id =
            util::generate_client_id(&args.client_id.clone().or(file.client_id));

        let username = args.username.clone().or(file.username);
        let password = args.password.clone().or(file.password);
        if username.is_some() != password.is_some() {
            return Err(RelayError::InvalidArgument(
                "username and password must be provided together".to_string(),
            ));
        }

        let clean_session = args
            .clean_session
            .or(file.clean_session)
            .unwrap_or(false);

        let topic = args.topic.clone().or(file.topic).ok_or_else(|| {
            RelayError::InvalidArgument(
                "no topic: pass --topic or set topic in the profile".to_string(),
            )
        })?;
        match args.mode {
            Mode::Listen => {
                // Validated here so malformed filters fail before connecting
                TopicFilter::new(topic.clone())?;
            }
            Mode::Publish => topics::validate_publish_topic(&topic)?,
        }

        if let Some(payload) = &args.message {
            message::validate_payload(payload)?;
        }

        let mut profile = ConnectionProfile::new(host, port, client_id);
        profile.clean_session = clean_session;
        if let (Some(username), Some(password)) = (username, password) {
            profile = profile.with_credentials(username, password);
        }

        Ok(Self {
            profile,
            topic,
            message: args.message.clone(),
            connect_timeout: Duration::from_secs(args.connect_timeout),
            ack_timeout: Duration::from_secs(args.ack_timeout),
        })
    }
}

/// Parse a broker address of the form `host`, `host:port`, or
/// `tcp://host:port`.
fn parse_broker_address(address: &str) -> Result<(String, Option<u16>), RelayError> {
    let address = address.strip_prefix("tcp://").unwrap_or(address);
    let (host, port) = match address.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                RelayError::InvalidArgument(format!("invalid broker port in '{}'", address))
            })?;
            (host, Some(port))
        }
        None => (address, None),
    };
    if host.is_empty() {
        return Err(RelayError::InvalidArgument(format!(
            "invalid broker address '{}'",
            address
        )));
    }
    Ok((host.to_string(), port))
}
