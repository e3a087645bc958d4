//! Courier - Broker
//!
//! The engine's narrow view of a publish/subscribe broker, and the
//! rumqttc-backed MQTT implementation of it.
//!
//! # Design
//!
//! The routing core only ever sees the [`Broker`] trait and a stream of
//! [`BrokerEvent`]s. The supervisor reacts to `Connected` by (re)asserting
//! subscriptions, to `Disconnected` by notifying the failover path, and to
//! `Message` by running the pipeline. Reconnection with capped exponential
//! back-off lives entirely inside the implementation; dispatch workers keep
//! draining while the connection is down.

mod backoff;
mod mqtt;

use async_trait::async_trait;
use courier_protocol::Message;
use thiserror::Error;

pub use backoff::Backoff;
pub use mqtt::{LWT_ALIVE, LWT_DEAD, MqttBroker};

/// Errors surfaced by a broker implementation
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A client request (subscribe, publish, disconnect) failed
    #[error("broker request failed: {0}")]
    Request(String),

    /// The event channel to the supervisor is gone
    #[error("broker event channel closed")]
    ChannelClosed,
}

/// Asynchronous events delivered by the broker connection
#[derive(Debug)]
pub enum BrokerEvent {
    /// Connection (re-)established; subscriptions must be (re)asserted
    Connected {
        /// Whether the broker resumed a previous session
        session_present: bool,
    },

    /// Connection lost; the implementation is already backing off and
    /// reconnecting
    Disconnected {
        /// Human-readable cause
        reason: String,
    },

    /// One message delivery
    Message(Message),
}

/// What the engine consumes from a broker client
///
/// Deliberately narrow: connection management, TLS, and wire details are
/// the implementation's business.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Subscribe to a topic pattern
    async fn subscribe(&self, pattern: &str, qos: u8) -> Result<(), BrokerError>;

    /// Publish a message
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: u8,
        retain: bool,
    ) -> Result<(), BrokerError>;

    /// Disconnect cleanly and stop the event loop
    async fn disconnect(&self) -> Result<(), BrokerError>;
}
