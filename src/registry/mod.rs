//! Connection Registry
//!
//! The ordered, append-only collection of client sessions and the only
//! shared mutable state in the crate. Handles are assigned sequentially
//! at connect time (0, 1, 2, ...) and a slot is never reused for a
//! different connection: disconnecting marks the slot closed but leaves
//! it in the sequence, so handles held by callers stay valid for the
//! lifetime of the registry.

pub mod types;

pub use types::{ConnectResponse, DisconnectResponse, Handle, ReadResponse, RegistryStats};

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::session::ClientSession;
use crate::Result;

/// Manages outbound TCP client sessions and their handle mapping
pub struct ClientRegistry {
    config: ClientConfig,
    // Lock scope is kept to slot access only; socket I/O always happens
    // on a cloned Arc after the lock is released, so a slow read on one
    // handle never blocks operations on another.
    clients: RwLock<Vec<Arc<ClientSession>>>,
}

impl ClientRegistry {
    /// Create a registry with the given connection defaults
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
        }
    }

    /// Open a new connection and return its handle.
    ///
    /// The session is fully established before the registry grows; a
    /// failed handshake leaves the slot sequence unchanged. A zero or
    /// omitted timeout falls back to the configured connect timeout.
    pub async fn connect(
        &self,
        host: &str,
        port: u16,
        connect_timeout: Option<Duration>,
    ) -> Result<Handle> {
        if host.trim().is_empty() {
            bail!("Must provide ip address to connect");
        }

        let timeout = effective_timeout(connect_timeout, self.config.connect_timeout);
        let session = Arc::new(ClientSession::connect(host, port, timeout).await?);

        let mut clients = self.clients.write().await;
        clients.push(session);
        let handle = clients.len() - 1;

        info!("Registered client {} for {}:{}", handle, host, port);
        Ok(handle)
    }

    /// Write the payload to the connection behind `handle`
    pub async fn send(&self, handle: Handle, bytes: &[u8]) -> Result<()> {
        let session = self.get(handle).await?;
        session.send(bytes, self.config.write_timeout).await
    }

    /// Bounded read from the connection behind `handle`.
    ///
    /// Only an invalid handle is an error; timeout, peer close, and
    /// transport failures all come back as `Ok` with an empty payload.
    /// A zero or omitted `max_len`/timeout falls back to the configured
    /// defaults (1024 bytes, 10 seconds).
    pub async fn read(
        &self,
        handle: Handle,
        max_len: Option<usize>,
        read_timeout: Option<Duration>,
    ) -> Result<Bytes> {
        let session = self.get(handle).await?;

        let max_len = match max_len {
            Some(len) if len > 0 => len,
            _ => self.config.max_read_len,
        };
        let timeout = effective_timeout(read_timeout, self.config.read_timeout);

        Ok(session.read(max_len, timeout).await)
    }

    /// Close the connection behind `handle` and return the same handle
    /// as acknowledgment.
    ///
    /// Closing is idempotent: disconnecting an already-closed handle
    /// succeeds again with the same handle. The slot stays in the
    /// registry, marked closed; a later send on it fails and a later
    /// read returns empty.
    pub async fn disconnect(&self, handle: Handle) -> Result<Handle> {
        let session = {
            let clients = self.clients.read().await;
            match clients.get(handle) {
                Some(session) => Arc::clone(session),
                None => bail!("No client specified"),
            }
        };

        session.close().await;
        debug!("Disconnected client {}", handle);
        Ok(handle)
    }

    /// Look up the session for a handle, cloning it out of the lock
    async fn get(&self, handle: Handle) -> Result<Arc<ClientSession>> {
        let clients = self.clients.read().await;
        match clients.get(handle) {
            Some(session) => Ok(Arc::clone(session)),
            None => bail!("No client specified or client index out of range"),
        }
    }

    /// Number of slots ever allocated
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether no connection has been made yet
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Number of slots whose socket is still connected
    pub async fn active_connections(&self) -> usize {
        let clients = self.clients.read().await;
        clients.iter().filter(|s| s.is_connected()).count()
    }

    /// Aggregate statistics across all slots
    pub async fn stats(&self) -> RegistryStats {
        let clients = self.clients.read().await;
        RegistryStats {
            total_slots: clients.len(),
            active_connections: clients.iter().filter(|s| s.is_connected()).count(),
            bytes_sent: clients.iter().map(|s| s.bytes_sent()).sum(),
            bytes_received: clients.iter().map(|s| s.bytes_received()).sum(),
        }
    }

    /// Close every live connection. Used on adapter shutdown.
    pub async fn close_all(&self) {
        let sessions: Vec<Arc<ClientSession>> = {
            let clients = self.clients.read().await;
            clients.iter().cloned().collect()
        };

        let live = sessions.iter().filter(|s| s.is_connected()).count();
        if live > 0 {
            info!("Closing {} live connections", live);
        }
        for session in sessions {
            session.close().await;
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

/// Zero and omitted timeouts fall back to the configured default
fn effective_timeout(requested: Option<Duration>, default: Duration) -> Duration {
    match requested {
        Some(timeout) if !timeout.is_zero() => timeout,
        _ => default,
    }
}
