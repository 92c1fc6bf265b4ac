//! MQTT transport adapter built on rumqttc.
//!
//! # Responsibilities
//! - Translate `mqtt://host:port` addresses and options into `MqttOptions`
//! - Drive the rumqttc event loop on a background task
//! - Map rumqttc events to `TransportEvent`
//! - Back off between reconnect attempts
//!
//! # Design Decisions
//! - rumqttc reconnects on the next `poll` after an error; we only add delay
//! - The event loop task stops once the event receiver is dropped

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

use crate::config::TransportOptions;
use crate::resilience::backoff::calculate_backoff;
use crate::transport::{Connector, PubSubClient, TransportError, TransportEvent, TransportSession};

const DEFAULT_MQTT_PORT: u16 = 1883;

/// Host and port of an MQTT broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

impl BrokerEndpoint {
    /// Parse `mqtt://host[:port]`, `tcp://host[:port]` or bare `host[:port]`.
    pub fn parse(address: &str) -> Result<Self, TransportError> {
        let invalid = |reason: &str| TransportError::InvalidAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        let normalized = if address.contains("://") {
            address.to_string()
        } else {
            format!("mqtt://{}", address)
        };
        let url = Url::parse(&normalized).map_err(|e| invalid(&e.to_string()))?;

        match url.scheme() {
            "mqtt" | "tcp" => {}
            other => return Err(invalid(&format!("unsupported scheme '{}'", other))),
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host"))?;

        Ok(Self {
            host: host.to_string(),
            port: url.port().unwrap_or(DEFAULT_MQTT_PORT),
        })
    }
}

/// Map a numeric QoS level to rumqttc's enum.
pub fn qos_from_level(level: u8) -> Result<QoS, TransportError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(TransportError::InvalidOption(format!("qos must be 0, 1 or 2, got {}", other))),
    }
}

/// Build rumqttc options from the configured transport options.
pub fn build_mqtt_options(endpoint: &BrokerEndpoint, options: &TransportOptions) -> MqttOptions {
    let client_id = options
        .client_id
        .clone()
        .unwrap_or_else(|| format!("mqtt-http-bridge-{}", Uuid::new_v4().simple()));

    let mut mqtt_options = MqttOptions::new(client_id, endpoint.host.clone(), endpoint.port);
    mqtt_options.set_keep_alive(Duration::from_secs(options.keep_alive_secs));
    mqtt_options.set_clean_session(options.clean_session);
    if let Some(username) = &options.username {
        mqtt_options.set_credentials(username.clone(), options.password.clone().unwrap_or_default());
    }
    mqtt_options
}

/// Connects to MQTT brokers.
#[derive(Debug, Default, Clone)]
pub struct MqttConnector;

impl MqttConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for MqttConnector {
    async fn connect(
        &self,
        address: &str,
        options: &TransportOptions,
    ) -> Result<TransportSession, TransportError> {
        let endpoint = BrokerEndpoint::parse(address)?;
        let qos = qos_from_level(options.qos)?;
        if options.keep_alive_secs < 5 {
            return Err(TransportError::InvalidOption(format!(
                "keep_alive_secs must be at least 5, got {}",
                options.keep_alive_secs
            )));
        }
        let mqtt_options = build_mqtt_options(&endpoint, options);

        tracing::info!(
            host = %endpoint.host,
            port = endpoint.port,
            client_id = %mqtt_options.client_id(),
            "Opening MQTT connection"
        );

        let (client, eventloop) = AsyncClient::new(mqtt_options, options.channel_capacity);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let backoff = ReconnectBackoff {
            base_ms: options.reconnect_base_delay_ms,
            max_ms: options.reconnect_max_delay_ms,
        };
        tokio::spawn(drive_event_loop(eventloop, events_tx, backoff));

        Ok(TransportSession {
            client: Arc::new(MqttClient { client, qos }),
            events: events_rx,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct ReconnectBackoff {
    base_ms: u64,
    max_ms: u64,
}

async fn drive_event_loop(
    mut eventloop: EventLoop,
    events: mpsc::UnboundedSender<TransportEvent>,
    backoff: ReconnectBackoff,
) {
    let mut connected = false;
    let mut attempt: u32 = 0;

    loop {
        let mut failed = false;
        let outgoing = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                attempt = 0;
                connected = true;
                vec![TransportEvent::Connected]
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => vec![TransportEvent::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            }],
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                tracing::trace!(pkid = ack.pkid, "SUBACK received");
                Vec::new()
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                if connected {
                    connected = false;
                    vec![TransportEvent::Disconnected]
                } else {
                    Vec::new()
                }
            }
            Ok(_) => Vec::new(),
            Err(e) => {
                failed = true;
                let mut out = Vec::with_capacity(2);
                if connected {
                    connected = false;
                    out.push(TransportEvent::Disconnected);
                }
                out.push(TransportEvent::Error(e.to_string()));
                out
            }
        };

        for event in outgoing {
            if events.send(event).is_err() {
                tracing::debug!("Event receiver dropped, stopping MQTT event loop");
                return;
            }
        }

        if failed {
            attempt = attempt.saturating_add(1);
            let delay = calculate_backoff(attempt, backoff.base_ms, backoff.max_ms);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Waiting before MQTT reconnect");
            tokio::time::sleep(delay).await;
        }
    }
}

/// `PubSubClient` over a rumqttc `AsyncClient`.
#[derive(Clone)]
pub struct MqttClient {
    client: AsyncClient,
    qos: QoS,
}

#[async_trait]
impl PubSubClient for MqttClient {
    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.client
            .subscribe(topic, self.qos)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.client
            .unsubscribe(topic)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client
            .publish(topic, self.qos, false, payload)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))
    }
}
