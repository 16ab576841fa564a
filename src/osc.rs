//! Snapshot dispatch - one OSC datagram per recall, over UDP.

use rosc::{OscMessage, OscPacket, OscType};
use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use thiserror::Error;
use tracing::trace;

use crate::mapping::SnapshotIndex;

/// OSC address the X Air firmware listens on for snapshot recall.
const SNAP_LOAD_ADDR: &str = "/-snap/load";

/// Where the mixer listens for OSC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerEndpoint {
    /// IPv4/IPv6 literal or hostname.
    pub host: String,
    pub port: u16,
}

impl MixerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for MixerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Transport-level failure while trying to get a datagram out.
///
/// Always recovered locally: scene changes must keep working while the
/// mixer is offline.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("cannot resolve mixer address {endpoint}: {source}")]
    Resolve { endpoint: String, source: io::Error },

    #[error("mixer address {0} did not resolve to any socket address")]
    NoAddress(String),

    #[error("failed to encode OSC packet: {0}")]
    Encode(#[from] rosc::OscError),

    #[error("failed to send OSC datagram to {endpoint}: {source}")]
    Io { endpoint: String, source: io::Error },
}

/// Sends snapshot-recall messages to the mixer.
///
/// The outgoing socket is bound once and reused for the process lifetime.
/// It is deliberately left unconnected; the destination is resolved per
/// send so the endpoint can change between sends on reconfiguration.
#[derive(Debug)]
pub struct SnapshotDispatcher {
    socket: UdpSocket,
}

impl SnapshotDispatcher {
    pub fn new() -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        Ok(Self { socket })
    }

    /// Sends one `/-snap/load` datagram recalling `index`.
    ///
    /// The mixer counts snapshots from 0 on the wire while every
    /// user-facing surface counts from 1, so the int argument is
    /// `index - 1`. No acknowledgment is awaited and no retry is made.
    pub fn dispatch(&self, index: SnapshotIndex, endpoint: &MixerEndpoint) -> Result<(), SendError> {
        let addr = resolve_endpoint(endpoint)?;
        let packet = OscPacket::Message(OscMessage {
            addr: SNAP_LOAD_ADDR.to_owned(),
            args: vec![OscType::Int(index.wire_index())],
        });
        let bytes = packet_bytes(&packet)?;
        trace!(bytes = bytes.len(), %endpoint, snapshot = %index, "sending snapshot recall");
        self.socket
            .send_to(&bytes, addr)
            .map_err(|source| SendError::Io {
                endpoint: endpoint.to_string(),
                source,
            })?;
        Ok(())
    }
}

fn resolve_endpoint(endpoint: &MixerEndpoint) -> Result<SocketAddr, SendError> {
    (endpoint.host.as_str(), endpoint.port)
        .to_socket_addrs()
        .map_err(|source| SendError::Resolve {
            endpoint: endpoint.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| SendError::NoAddress(endpoint.to_string()))
}

fn packet_bytes(packet: &OscPacket) -> Result<Vec<u8>, SendError> {
    Ok(rosc::encoder::encode(packet)?)
}
