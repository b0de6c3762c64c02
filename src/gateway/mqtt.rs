// MIT License - Copyright (c) 2026 Peter Wright
// MQTT gateway
//
// Owns the broker session exclusively. Wakes on the MQTT notification
// line, reads the current snapshot from the store and publishes four
// retained values per record.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::devices::record::DeviceRecord;
use crate::error::Result;
use crate::notify::ChangeListener;
use crate::state::StateStore;

/// Upper bound on a single enqueued publish.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Broker connection parameters, fixed at startup.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Base of the `<base>/<kind>/<id>/<field>` topic tree.
    pub base_topic: String,
    pub keep_alive: Duration,
    /// Accepted for compatibility with the original flag surface;
    /// rumqttc times out pings from the keep-alive on its own.
    pub ping_timeout: Duration,
}

/// Run the MQTT consumer until shutdown.
///
/// A connect failure before the first ConnAck is returned to the caller;
/// after that, per-publish and connection errors are logged and the task
/// keeps going.
pub async fn run(
    config: MqttConfig,
    store: Arc<StateStore>,
    mut listener: ChangeListener,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut options = MqttOptions::new("hikax-bridge", &config.host, config.port);
    options.set_credentials(&config.username, &config.password);
    options.set_keep_alive(config.keep_alive);
    debug!(
        "Ping timeout {:.0}s is handled by the client's keep-alive",
        config.ping_timeout.as_secs_f64()
    );

    let (client, mut eventloop) = AsyncClient::new(options, 64);

    // Drive the event loop until the broker accepts the session; a
    // failure here is a startup error and escalates.
    loop {
        match eventloop.poll().await? {
            Event::Incoming(Packet::ConnAck(_)) => break,
            _ => continue,
        }
    }
    info!("Connected to MQTT broker at {}:{}", config.host, config.port);

    // The event loop must keep turning for the lifetime of the session
    // (acks, pings, reconnects). Publish errors surface on the client
    // side, so here we only log and pace retries.
    let driver = tokio::spawn(async move {
        loop {
            if let Err(e) = eventloop.poll().await {
                error!("MQTT event loop error: {e}");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    });

    loop {
        tokio::select! {
            generation = listener.changed() => {
                match generation {
                    Some(generation) => {
                        debug!("Publishing snapshot (generation {generation})");
                        let snapshot = store.current().await;
                        for record in snapshot.records() {
                            publish_record(&client, &config.base_topic, record).await;
                        }
                    }
                    None => {
                        info!("Change bus closed, MQTT publisher stopping");
                        break;
                    }
                }
            }
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    info!("MQTT publisher stopping");
                    break;
                }
            }
        }
    }

    driver.abort();
    if let Err(e) = client.disconnect().await {
        warn!("Error disconnecting from broker: {e}");
    }
    Ok(())
}

/// Publish the four per-field retained values for one record.
async fn publish_record(client: &AsyncClient, base_topic: &str, record: &DeviceRecord) {
    let fields = [
        ("name", record.name.clone()),
        ("signal", record.signal.to_string()),
        ("temperature", record.temperature.to_string()),
        ("charge", record.charge_value.to_string()),
    ];
    for (field, payload) in fields {
        let topic = field_topic(base_topic, record, field);
        publish_retained(client, &topic, payload).await;
    }
}

/// `<base>/<kind>/<id>/<field>`
fn field_topic(base_topic: &str, record: &DeviceRecord, field: &str) -> String {
    format!("{base_topic}/{}/{}/{field}", record.kind, record.id)
}

async fn publish_retained(client: &AsyncClient, topic: &str, payload: String) {
    match timeout(
        PUBLISH_TIMEOUT,
        client.publish(topic, QoS::AtLeastOnce, true, payload),
    )
    .await
    {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Failed to publish to {topic}: {e}"),
        Err(_) => error!(
            "Publish to {topic} timed out after {:.0}s",
            PUBLISH_TIMEOUT.as_secs_f64()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::record::DeviceKind;

    fn record(kind: DeviceKind, id: u32) -> DeviceRecord {
        DeviceRecord {
            kind,
            id,
            name: "Door".to_string(),
            signal: 50,
            temperature: 20,
            charge_value: 85,
        }
    }

    #[test]
    fn test_field_topic_layout() {
        let zone = record(DeviceKind::Zone, 1);
        assert_eq!(field_topic("hikax", &zone, "charge"), "hikax/zone/1/charge");
        assert_eq!(field_topic("hikax", &zone, "name"), "hikax/zone/1/name");

        let siren = record(DeviceKind::Siren, 3);
        assert_eq!(
            field_topic("home/alarm", &siren, "signal"),
            "home/alarm/siren/3/signal"
        );
    }
}
