//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Literal host name accepted in addition to IPv4 addresses
pub const LOCALHOST: &str = "localhost";

/// A validated WebSocket endpoint on the device
///
/// Only constructible through [`Endpoint::new`] or [`Endpoint::parse`], so
/// every value held by the client has passed host and port validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Validate a host and an already-numeric port
    pub fn new(host: &str, port: u16) -> Result<Self, ValidationError> {
        let host = host.trim();
        if !is_valid_host(host) {
            return Err(ValidationError::InvalidHost(host.to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Validate operator-entered host and port text
    pub fn parse(host: &str, port: &str) -> Result<Self, ValidationError> {
        Self::new(host, parse_port(port)?)
    }

    /// Host name or address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// WebSocket URL for this endpoint
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    /// Whether this endpoint targets the local machine (development mode)
    pub fn is_local(&self) -> bool {
        is_local_host(&self.host)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            host: String,
            port: u16,
        }

        let raw = Raw::deserialize(deserializer)?;
        Endpoint::new(&raw.host, raw.port).map_err(serde::de::Error::custom)
    }
}

/// Whether `host` is a dotted-quad IPv4 address or the literal `localhost`
pub fn is_valid_host(host: &str) -> bool {
    if host == LOCALHOST {
        return true;
    }

    let octets: Vec<&str> = host.split('.').collect();
    octets.len() == 4
        && octets.iter().all(|octet| {
            (1..=3).contains(&octet.len())
                && octet.bytes().all(|b| b.is_ascii_digit())
                && octet.parse::<u16>().map(|v| v <= 255).unwrap_or(false)
        })
}

/// Whether `host` names the local machine
pub fn is_local_host(host: &str) -> bool {
    host.trim().eq_ignore_ascii_case(LOCALHOST)
}

/// Parse a port number in 0..=65535
pub fn parse_port(port: &str) -> Result<u16, ValidationError> {
    port.trim()
        .parse::<u16>()
        .map_err(|_| ValidationError::InvalidPort(port.to_string()))
}

/// The operator's requested connection state
///
/// A plain request: the supervisor reads it and reconciles actual state
/// towards it. It does not own anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIntent {
    /// Whether a connection is wanted
    pub desired: bool,
    /// Where to connect
    pub endpoint: Endpoint,
}

impl ConnectionIntent {
    /// Intent to connect to `endpoint`
    pub fn connect(endpoint: Endpoint) -> Self {
        Self {
            desired: true,
            endpoint,
        }
    }
}

/// Actual connection state, owned by the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No session and none wanted
    #[default]
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Session open, frames flowing
    Connected,
    /// Last session failed; waiting for the operator
    Error,
}

impl ConnectionState {
    /// Whether a session is live or being established
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }

    /// Label shown on the connection indicator
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Connected => "Connected",
            ConnectionState::Error => "Connection Error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Error => write!(f, "error"),
        }
    }
}

/// Identifier of one transport session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// The first session id handed out
    pub const FIRST: SessionId = SessionId(1);

    /// The id that follows this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_localhost_and_ipv4_accepted() {
        assert!(Endpoint::parse("localhost", "4444").is_ok());
        assert!(Endpoint::parse("192.168.1.20", "4444").is_ok());
        assert!(Endpoint::parse("0.0.0.0", "0").is_ok());
        assert!(Endpoint::parse("255.255.255.255", "65535").is_ok());
    }

    #[test]
    fn test_invalid_hosts_rejected() {
        for host in [
            "",
            "example.com",
            "256.1.1.1",
            "1.2.3",
            "1.2.3.4.5",
            "1..2.3",
            "a.b.c.d",
            "1.2.3.-4",
            "1234.1.1.1",
        ] {
            assert_eq!(
                Endpoint::parse(host, "4444"),
                Err(ValidationError::InvalidHost(host.to_string())),
                "{host} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_ports_rejected() {
        for port in ["", "-1", "65536", "44a4", "4.5"] {
            assert_eq!(
                Endpoint::parse("localhost", port),
                Err(ValidationError::InvalidPort(port.to_string()))
            );
        }
    }

    #[test]
    fn test_endpoint_url() {
        let endpoint = Endpoint::parse(" 10.0.0.7 ", " 4444 ").unwrap();
        assert_eq!(endpoint.url(), "ws://10.0.0.7:4444");
        assert_eq!(endpoint.to_string(), "10.0.0.7:4444");
        assert!(!endpoint.is_local());
        assert!(Endpoint::new("localhost", 1).unwrap().is_local());
    }

    #[test]
    fn test_endpoint_deserialize_validates() {
        let ok: Endpoint = serde_json::from_str(r#"{"host":"localhost","port":4444}"#).unwrap();
        assert_eq!(ok.port(), 4444);
        assert!(serde_json::from_str::<Endpoint>(r#"{"host":"nope","port":1}"#).is_err());
    }

    #[test]
    fn test_connection_state_labels() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::Error.label(), "Connection Error");
        assert_eq!(format!("{}", ConnectionState::Connected), "connected");
        assert!(ConnectionState::Connecting.is_active());
        assert!(!ConnectionState::Error.is_active());
    }

    #[test]
    fn test_session_ids_increase() {
        let first = SessionId::FIRST;
        assert!(first.next() > first);
        assert_eq!(first.next().to_string(), "session-2");
    }

    proptest! {
        #[test]
        fn prop_every_dotted_quad_is_valid(a: u8, b: u8, c: u8, d: u8, port: u16) {
            let host = format!("{}.{}.{}.{}", a, b, c, d);
            let endpoint = Endpoint::parse(&host, &port.to_string()).unwrap();
            prop_assert_eq!(endpoint.url(), format!("ws://{}:{}", host, port));
        }

        #[test]
        fn prop_ports_above_range_rejected(port in 65536u32..1_000_000) {
            prop_assert!(Endpoint::parse("localhost", &port.to_string()).is_err());
        }
    }
}
