//! rumqttc-backed broker implementation
//!
//! Owns the MQTT event loop in a background task. Incoming publishes become
//! [`BrokerEvent::Message`]; connection losses become
//! [`BrokerEvent::Disconnected`] followed by capped exponential back-off and
//! a reconnect attempt. The last-will topic, when configured, is registered
//! with the broker as `"0"` retained before connecting.

use std::time::Duration;

use async_trait::async_trait;
use courier_config::BrokerConfig;
use courier_protocol::Message;
use rumqttc::{AsyncClient, Event, LastWill, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::backoff::Backoff;
use crate::{Broker, BrokerError, BrokerEvent};

/// Payload published on the last-will topic while connected
pub const LWT_ALIVE: &str = "1";

/// Payload the broker publishes on our behalf if the connection dies
pub const LWT_DEAD: &str = "0";

/// MQTT broker client
pub struct MqttBroker {
    client: AsyncClient,
    cancel: CancellationToken,
}

impl MqttBroker {
    /// Start the connection and its event loop
    ///
    /// Returns the client handle plus the receiver the supervisor drains
    /// for connection and message events. The event loop keeps reconnecting
    /// with back-off until [`Broker::disconnect`] is called or the receiver
    /// is dropped.
    pub fn connect(config: &BrokerConfig) -> (Self, mpsc::Receiver<BrokerEvent>) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.host.clone(),
            config.port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        options.set_clean_session(config.clean_session);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username.clone(), password.clone());
        }

        if let Some(lwt_topic) = &config.lwt_topic {
            options.set_last_will(LastWill::new(
                lwt_topic.clone(),
                LWT_DEAD,
                QoS::AtMostOnce,
                true,
            ));
        }

        let (client, event_loop) = AsyncClient::new(options, 64);
        let (tx, rx) = mpsc::channel(1024);
        let cancel = CancellationToken::new();

        let backoff = Backoff::new(
            Duration::from_secs(config.reconnect_min_secs),
            Duration::from_secs(config.reconnect_max_secs),
        );

        tracing::info!(
            host = %config.host,
            port = config.port,
            client_id = %config.client_id,
            "connecting to MQTT broker"
        );

        tokio::spawn(run_event_loop(event_loop, tx, backoff, cancel.clone()));

        (Self { client, cancel }, rx)
    }
}

#[async_trait]
impl Broker for MqttBroker {
    async fn subscribe(&self, pattern: &str, qos: u8) -> Result<(), BrokerError> {
        tracing::debug!(pattern = %pattern, qos = qos, "subscribing");
        self.client
            .subscribe(pattern, to_qos(qos))
            .await
            .map_err(|e| BrokerError::Request(e.to_string()))
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: u8,
        retain: bool,
    ) -> Result<(), BrokerError> {
        self.client
            .publish(topic, to_qos(qos), retain, payload)
            .await
            .map_err(|e| BrokerError::Request(e.to_string()))
    }

    async fn disconnect(&self) -> Result<(), BrokerError> {
        self.cancel.cancel();
        self.client
            .disconnect()
            .await
            .map_err(|e| BrokerError::Request(e.to_string()))
    }
}

async fn run_event_loop(
    mut event_loop: rumqttc::EventLoop,
    tx: mpsc::Sender<BrokerEvent>,
    mut backoff: Backoff,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = event_loop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                backoff.reset();
                tracing::info!(session_present = ack.session_present, "connected to MQTT broker");
                if tx
                    .send(BrokerEvent::Connected {
                        session_present: ack.session_present,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }

            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let msg = Message::new(
                    publish.topic.clone(),
                    publish.payload.clone(),
                    from_qos(publish.qos),
                    publish.retain,
                );
                if tx.send(BrokerEvent::Message(msg)).await.is_err() {
                    break;
                }
            }

            Ok(_) => {}

            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(error = %reason, "MQTT connection error");
                if tx
                    .send(BrokerEvent::Disconnected { reason })
                    .await
                    .is_err()
                {
                    break;
                }

                // The next poll reconnects; wait out the back-off first so a
                // flapping broker is not hammered.
                let delay = backoff.next();
                tracing::info!(
                    delay_secs = delay.as_secs(),
                    attempt = backoff.attempt(),
                    "reconnecting after back-off"
                );
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    tracing::debug!("MQTT event loop stopped");
}

fn to_qos(qos: u8) -> QoS {
    match qos {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

fn from_qos(qos: QoS) -> u8 {
    match qos {
        QoS::AtMostOnce => 0,
        QoS::AtLeastOnce => 1,
        QoS::ExactlyOnce => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qos_mapping_roundtrip() {
        for qos in [0u8, 1, 2] {
            assert_eq!(from_qos(to_qos(qos)), qos);
        }
        // Anything above 2 clamps to exactly-once.
        assert_eq!(from_qos(to_qos(7)), 2);
    }
}
