//! MQTT Relay Library
//!
//! This library provides the core functionality for the mqtt-relay CLI tool.
//! It includes modules for CLI argument parsing, connection profile resolution,
//! the MQTT client wrapper, and the two relay roles (listener and publisher).

pub mod cli;
pub mod config;
pub mod error;
pub mod listener;
pub mod message;
pub mod mqtt;
pub mod publisher;
pub mod topics;
pub mod util;
