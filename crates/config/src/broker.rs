//! Broker connection settings

use serde::Deserialize;

/// MQTT broker connection configuration
///
/// # Example
///
/// ```toml
/// [broker]
/// host = "broker.example.org"
/// port = 1883
/// client_id = "courier"
/// lwt_topic = "clients/courier"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker hostname or IP address
    /// Default: "localhost"
    pub host: String,

    /// Broker port
    /// Default: 1883
    pub port: u16,

    /// MQTT client identifier
    /// Default: "courier"
    pub client_id: String,

    /// Username for broker authentication
    pub username: Option<String>,

    /// Password for broker authentication
    pub password: Option<String>,

    /// Keep-alive interval, seconds
    /// Default: 60
    pub keep_alive_secs: u64,

    /// Request a clean session on connect
    /// Default: true
    pub clean_session: bool,

    /// Last-will topic; when set, "1" is published retained on connect and
    /// the broker publishes "0" retained if the connection dies
    pub lwt_topic: Option<String>,

    /// Initial reconnect back-off after a connection loss, seconds
    /// Default: 1
    pub reconnect_min_secs: u64,

    /// Reconnect back-off cap, seconds
    /// Default: 30
    pub reconnect_max_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            client_id: "courier".into(),
            username: None,
            password: None,
            keep_alive_secs: 60,
            clean_session: true,
            lwt_topic: None,
            reconnect_min_secs: 1,
            reconnect_max_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrokerConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1883);
        assert_eq!(config.client_id, "courier");
        assert!(config.clean_session);
        assert!(config.lwt_topic.is_none());
    }

    #[test]
    fn test_deserialize_with_auth() {
        let toml = r#"
host = "10.0.0.5"
port = 8883
username = "router"
password = "hunter2"
clean_session = false
"#;
        let config: BrokerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 8883);
        assert_eq!(config.username.as_deref(), Some("router"));
        assert!(!config.clean_session);
        // Defaults still apply
        assert_eq!(config.keep_alive_secs, 60);
        assert_eq!(config.reconnect_max_secs, 30);
    }
}
