//! MQTT Relay - minimal listener/publisher against an MQTT broker
//!
//! This CLI tool provides two operational modes:
//! - **Listen**: Subscribe to a topic filter with QoS 1 and log every delivered
//!   message until a termination signal arrives
//! - **Publish**: Publish one JSON message with QoS 1, wait for the broker's
//!   acknowledgment, and disconnect
//!
//! There is no reconnection logic anywhere: every failure surfaces at the
//! process boundary so an external supervisor can apply its restart policy.
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success (including graceful shutdown) |
//! | 1 | Configuration/argument error |
//! | 2 | Connection failure, authentication failure, or link loss |
//! | 3 | Subscribe/publish request rejected |

mod cli;
mod config;
mod error;
mod listener;
mod message;
mod mqtt;
mod publisher;
mod topics;
mod util;

use clap::Parser;
use std::process::ExitCode;
use tokio::sync::broadcast;
use tracing::{info, warn};

use cli::{Args, Mode};
use config::RelaySettings;
use error::RelayError;
use listener::Listener;
use mqtt::MqttClient;
use publisher::Publisher;
use topics::TopicFilter;

/// Exit code for success (including graceful shutdown)
const EXIT_SUCCESS: u8 = 0;
/// Exit code for configuration/argument errors
const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for connection, authentication, and link-loss errors
const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code for rejected subscribe/publish requests
const EXIT_REQUEST_ERROR: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();
    if let Err(e) = args.validate() {
        eprintln!("Error: Configuration error: {}", e);
        eprintln!("  Hint: Use --help for usage information");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    match run(args).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(error_to_exit_code(&e))
        }
    }
}

/// Main application logic: resolve settings, wire up shutdown signals, and
/// dispatch to the selected role.
async fn run(args: Args) -> Result<(), RelayError> {
    let settings = RelaySettings::resolve(&args)?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let shutdown_tx_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            eprintln!("Error setting up signal handler: {}", e);
        }
        let _ = shutdown_tx_signal.send(());
    });

    match args.mode {
        Mode::Listen => run_listen_mode(&args, &settings, shutdown_tx.subscribe()).await,
        Mode::Publish => run_publish_mode(&settings).await,
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM signals.
async fn wait_for_shutdown_signal() -> Result<(), RelayError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(RelayError::Io)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(RelayError::Io)?;

        tokio::select! {
            _ = sigint.recv() => {
                eprintln!("\nReceived SIGINT (Ctrl+C), initiating graceful shutdown...");
            }
            _ = sigterm.recv() => {
                eprintln!("\nReceived SIGTERM, initiating graceful shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        // On non-Unix platforms, only handle Ctrl+C
        tokio::signal::ctrl_c().await.map_err(RelayError::Io)?;
        eprintln!("\nReceived Ctrl+C, initiating graceful shutdown...");
    }

    Ok(())
}

/// Run the listener until shutdown or link loss.
async fn run_listen_mode(
    args: &Args,
    settings: &RelaySettings,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), RelayError> {
    let filter = TopicFilter::new(settings.topic.clone())?;
    let qos = util::u8_to_qos(args.qos);

    info!(
        host = %settings.profile.host,
        port = settings.profile.port,
        client_id = %settings.profile.client_id,
        clean_session = settings.profile.clean_session,
        "starting listener"
    );

    let client = MqttClient::connect(&settings.profile);
    let mut listener = Listener::new(client, filter, qos);
    let delivered = listener.run(shutdown).await?;

    info!("listener stopped after {} message(s)", delivered);
    Ok(())
}

/// Publish one message and wait for the acknowledgment.
async fn run_publish_mode(settings: &RelaySettings) -> Result<(), RelayError> {
    let payload = match &settings.message {
        Some(body) => body.clone(),
        None => message::default_payload()?,
    };

    info!(
        host = %settings.profile.host,
        port = settings.profile.port,
        client_id = %settings.profile.client_id,
        topic = %settings.topic,
        "starting publisher"
    );

    let client = MqttClient::connect(&settings.profile);
    let publisher = Publisher::new(
        client,
        settings.topic.clone(),
        settings.connect_timeout,
        settings.ack_timeout,
    );

    if !publisher.run(payload.as_bytes()).await? {
        // The attempt was made; a lost ack is reported, not retried
        warn!("publish completed without an observed acknowledgment");
    }
    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` controls the filter; the default shows the relay's own info
/// logs so every received message appears on standard diagnostic output.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Map an error to the process exit code.
fn error_to_exit_code(error: &RelayError) -> u8 {
    match error {
        RelayError::Connection(_) | RelayError::LinkLost(_) | RelayError::Timeout(_) => {
            EXIT_CONNECTION_ERROR
        }
        RelayError::Client(_) | RelayError::SubscriptionRejected(_) => EXIT_REQUEST_ERROR,
        // Io/Json only arise from profile and payload handling here
        RelayError::Io(_) | RelayError::Json(_) | RelayError::InvalidArgument(_) => {
            EXIT_CONFIG_ERROR
        }
    }
}
