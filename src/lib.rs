//! Async Rust client for DIVUS D+ building-automation servers
//!
//! This crate talks to a D+ server over its HTTP/XML interface: it
//! discovers controllable devices by walking the controller's
//! hierarchical object store, projects them as typed entities (lights,
//! switches, covers, climate, temperature sensors), keeps entity state
//! synchronized via periodic batched polling, and relays commands back
//! to the controller.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use divus_dplus_rust::{
//!     Coordinator, DplusConfig, DplusCredentials, DplusHttpClient,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DplusConfig::from_env()?;
//!     let credentials = DplusCredentials::from_env()?;
//!
//!     let client = Arc::new(DplusHttpClient::new(config.clone(), credentials)?);
//!     let coordinator = Coordinator::new(client, &config);
//!
//!     coordinator.first_refresh().await?;
//!
//!     let shutdown = CancellationToken::new();
//!     coordinator.run(shutdown).await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod entities;
pub mod error;
pub mod logging;

// Re-export main types
pub use crate::{
    client::{http_client::DplusHttpClient, Device, DeviceState, SurroundingNode},
    config::{credentials::DplusCredentials, DplusConfig},
    coordinator::Coordinator,
    discovery::discover_devices,
    entities::{DeviceClass, DplusEntity, Entity, IntegrationContext},
    error::{DplusError, Result},
    logging::{init_logging, LogConfig},
};
