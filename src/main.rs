// MIT License - Copyright (c) 2026 Peter Wright
// Bridge binary

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use hikax_bridge::gateway;
use hikax_bridge::{
    ChangeNotifier, DeviceConfig, HikAxClient, HttpState, MqttConfig, Poller, StateStore,
};

/// How long tasks get to wind down after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "hikax-bridge")]
#[command(about = "Bridge between a Hikvision AX security panel, MQTT and the browser")]
#[command(version)]
struct Cli {
    /// Listen address for the HTTP server
    #[arg(short = 'l', long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Host of the Hikvision AX device
    #[arg(long, env = "HIKAX_HOST", required = true)]
    hikax_host: String,

    /// Port of the device
    #[arg(long, env = "HIKAX_PORT", default_value_t = 80)]
    hikax_port: u16,

    /// Username to access the device
    #[arg(long, env = "HIKAX_USERNAME", required = true)]
    hikax_username: String,

    /// Password to access the device
    #[arg(long, env = "HIKAX_PASSWORD", required = true)]
    hikax_password: String,

    /// Polling time in seconds (0 falls back to the default)
    #[arg(long, env = "POLLING_TIME", default_value_t = 10)]
    polling_time: u64,

    /// Device fetch timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT", default_value_t = 5)]
    fetch_timeout: u64,

    /// Host of the MQTT broker
    #[arg(long, env = "MQTT_HOST", required = true)]
    mqtt_host: String,

    /// Port of the MQTT broker
    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    mqtt_port: u16,

    /// Username to access the MQTT broker
    #[arg(long, env = "MQTT_USERNAME", required = true)]
    mqtt_username: String,

    /// Password to access the MQTT broker
    #[arg(long, env = "MQTT_PASSWORD", required = true)]
    mqtt_password: String,

    /// Base topic to publish the data under
    #[arg(long, env = "MQTT_TOPIC", required = true)]
    mqtt_topic: String,

    /// Broker keep-alive time in seconds
    #[arg(long, env = "MQTT_KEEP_ALIVE", default_value_t = 60)]
    mqtt_keep_alive: u64,

    /// Broker ping timeout in seconds
    #[arg(long, env = "MQTT_PING_TIMEOUT", default_value_t = 30)]
    mqtt_ping_timeout: u64,

    /// Debug mode
    #[arg(long, env = "DEBUG")]
    dbg: bool,
}

fn polling_interval(seconds: u64) -> Duration {
    if seconds == 0 {
        Duration::from_secs(10)
    } else {
        Duration::from_secs(seconds)
    }
}

fn setup_logging(dbg: bool) {
    let default_filter = if dbg { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // systemd journal already adds timestamps, so omit them when running
    // under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.dbg);
    info!("hikax-bridge {}", env!("CARGO_PKG_VERSION"));

    let device_config = DeviceConfig {
        host: cli.hikax_host.clone(),
        port: cli.hikax_port,
        username: cli.hikax_username.clone(),
        password: cli.hikax_password.clone(),
        request_timeout: Duration::from_secs(cli.fetch_timeout.max(1)),
    };
    let mqtt_config = MqttConfig {
        host: cli.mqtt_host.clone(),
        port: cli.mqtt_port,
        username: cli.mqtt_username.clone(),
        password: cli.mqtt_password.clone(),
        base_topic: cli.mqtt_topic.clone(),
        keep_alive: Duration::from_secs(cli.mqtt_keep_alive.max(1)),
        ping_timeout: Duration::from_secs(cli.mqtt_ping_timeout.max(1)),
    };

    let client =
        HikAxClient::new(device_config).context("Failed to build device client")?;
    let store = Arc::new(StateStore::new());

    // Subscribe both consumer classes before the first poll so no change
    // can slip past either of them.
    let notifier = ChangeNotifier::new();
    let http_line = notifier.subscribe();
    let mqtt_line = notifier.subscribe();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Task 1: poll loop
    let poller = Poller::new(
        client,
        Arc::clone(&store),
        notifier,
        polling_interval(cli.polling_time),
        Duration::from_secs(cli.fetch_timeout.max(1)),
    );
    let poll_handle = tokio::spawn(poller.run(shutdown_rx.clone()));

    // Task 2: HTTP gateway
    info!("Starting HTTP server on {}", cli.listen);
    let http_state = HttpState::new(Arc::clone(&store), http_line);
    let listen = cli.listen.clone();
    let http_shutdown = shutdown_rx.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(e) = gateway::http::serve(&listen, http_state, http_shutdown).await {
            error!("HTTP server failed: {e}");
        }
    });

    // Task 3: MQTT gateway
    info!("Starting MQTT publisher");
    let mqtt_store = Arc::clone(&store);
    let mqtt_shutdown = shutdown_rx.clone();
    let mqtt_handle = tokio::spawn(async move {
        if let Err(e) = gateway::mqtt::run(mqtt_config, mqtt_store, mqtt_line, mqtt_shutdown).await
        {
            error!("MQTT gateway failed: {e}");
        }
    });

    // Wait for a signal
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down..."),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
    }

    // Stop tasks, giving each a bounded grace period before aborting.
    let _ = shutdown_tx.send(true);
    let tasks: [(&str, JoinHandle<()>); 3] = [
        ("poll loop", poll_handle),
        ("HTTP server", http_handle),
        ("MQTT publisher", mqtt_handle),
    ];
    for (name, handle) in tasks {
        match timeout(SHUTDOWN_GRACE, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("{name} task panicked: {e}"),
            Err(_) => warn!(
                "{name} did not stop within {:.0}s, abandoning",
                SHUTDOWN_GRACE.as_secs_f64()
            ),
        }
    }

    info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polling_interval_zero_falls_back() {
        assert_eq!(polling_interval(0), Duration::from_secs(10));
        assert_eq!(polling_interval(30), Duration::from_secs(30));
    }

    #[test]
    fn test_cli_requires_device_and_broker_credentials() {
        let result = Cli::try_parse_from(["hikax-bridge"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_full_invocation() {
        let cli = Cli::try_parse_from([
            "hikax-bridge",
            "--hikax-host", "192.168.1.50",
            "--hikax-username", "admin",
            "--hikax-password", "secret",
            "--mqtt-host", "broker.local",
            "--mqtt-username", "mqtt",
            "--mqtt-password", "mqtt",
            "--mqtt-topic", "hikax",
        ])
        .unwrap();
        assert_eq!(cli.listen, "0.0.0.0:8080");
        assert_eq!(cli.hikax_port, 80);
        assert_eq!(cli.mqtt_port, 1883);
        assert_eq!(cli.polling_time, 10);
        assert_eq!(cli.mqtt_keep_alive, 60);
        assert!(!cli.dbg);
    }
}
