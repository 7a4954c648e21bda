//! One-shot TCP client for the engine's localhost command listener.
//!
//! Each call opens a fresh connection, writes one newline-terminated
//! payload and disconnects. The engine never answers on this socket; status
//! replies arrive later over the push channel. No pooling and no retries:
//! call volume is one request per uncached badge lookup, and the visit TTL
//! already provides the retry cadence.

use std::env;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use harbor_shell_protocol::default_engine_addr;

const ENGINE_ADDR_ENV: &str = "HARBOR_ENGINE_ADDR";
const CONNECT_TIMEOUT_MS: u64 = 3000;
const WRITE_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to engine at {addr}: {source}")]
    Connect { addr: SocketAddr, source: io::Error },
    #[error("failed to write engine command: {0}")]
    Write(io::Error),
}

/// Resolved engine address: `HARBOR_ENGINE_ADDR` when set and parsable,
/// otherwise the well-known localhost port.
pub fn engine_addr() -> SocketAddr {
    match env::var(ENGINE_ADDR_ENV) {
        Ok(value) => match value.parse() {
            Ok(addr) => addr,
            Err(_) => {
                warn!(addr = %value, "Ignoring unparsable engine address override");
                default_engine_addr()
            }
        },
        Err(_) => default_engine_addr(),
    }
}

pub struct Transport {
    addr: SocketAddr,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl Transport {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
            write_timeout: Duration::from_millis(WRITE_TIMEOUT_MS),
        }
    }

    pub fn from_env() -> Self {
        Self::new(engine_addr())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Writes the payload plus the `\n` frame terminator on a fresh
    /// connection. Bounded by the connect and write timeouts, so a dead or
    /// wedged engine stalls the calling thread for a few seconds at most.
    pub fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        let mut stream =
            TcpStream::connect_timeout(&self.addr, self.connect_timeout).map_err(|source| {
                TransportError::Connect {
                    addr: self.addr,
                    source,
                }
            })?;
        let _ = stream.set_write_timeout(Some(self.write_timeout));

        stream.write_all(payload).map_err(TransportError::Write)?;
        stream.write_all(b"\n").map_err(TransportError::Write)?;
        stream.flush().ok();
        Ok(())
    }
}
