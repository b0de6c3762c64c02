// MIT License - Copyright (c) 2026 Peter Wright
// Panel-to-MQTT/browser bridge

//! # hikax-bridge
//!
//! Bridges a Hikvision AX security panel to two independent consumers: a
//! browser (live SSE push stream) and an MQTT broker (per-field retained
//! topics).
//!
//! The pipeline is a single poll loop: fetch zone and auxiliary device
//! status over ISAPI, normalize into a [`Snapshot`], detect changes
//! against the last published snapshot, and on change update the shared
//! [`StateStore`] and wake both consumer classes through the
//! [`ChangeNotifier`]. Signaling never blocks the poll loop, whether or
//! not anyone is listening.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use hikax_bridge::{
//!     ChangeNotifier, DeviceConfig, HikAxClient, Poller, StateStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = HikAxClient::new(DeviceConfig {
//!         host: "192.168.1.50".to_string(),
//!         port: 80,
//!         username: "admin".to_string(),
//!         password: "secret".to_string(),
//!         request_timeout: Duration::from_secs(5),
//!     })?;
//!
//!     let store = Arc::new(StateStore::new());
//!     let notifier = ChangeNotifier::new();
//!     let mut updates = notifier.subscribe();
//!
//!     let poller = Poller::new(
//!         client,
//!         Arc::clone(&store),
//!         notifier,
//!         Duration::from_secs(10),
//!         Duration::from_secs(5),
//!     );
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     tokio::spawn(poller.run(shutdown_rx));
//!
//!     while updates.changed().await.is_some() {
//!         for record in store.current().await.records() {
//!             println!("{} {}: charge {}%", record.kind, record.id, record.charge_value);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod devices;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod poller;
pub mod state;

// Re-exports for convenience
pub use client::{DeviceConfig, HikAxClient, StatusSource};
pub use devices::record::{DeviceKind, DeviceRecord, Snapshot};
pub use error::{BridgeError, Result};
pub use gateway::http::HttpState;
pub use gateway::mqtt::MqttConfig;
pub use notify::{ChangeListener, ChangeNotifier};
pub use poller::Poller;
pub use state::StateStore;
