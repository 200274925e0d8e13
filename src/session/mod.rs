//! Client Session
//!
//! Wraps one outbound TCP socket: connect with a hard timeout bound,
//! deadline-bounded send, bounded read that soft-fails to an empty
//! payload, and idempotent close. A session is owned exclusively by its
//! registry slot and is never shared across handles.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::Result;

/// One live (or previously live) TCP connection
pub struct ClientSession {
    session_id: String,
    peer_addr: SocketAddr,
    opened_at: Instant,
    connected: AtomicBool,
    // Split halves so a blocked read never holds up a concurrent send
    // on the same session.
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
}

impl ClientSession {
    /// Establish a TCP connection to (host, port) within the timeout bound
    pub async fn connect(host: &str, port: u16, connect_timeout: Duration) -> Result<Self> {
        debug!("Attempting to connect to {}:{}", host, port);

        let socket_addrs = Self::resolve_addrs(host, port, connect_timeout)
            .await
            .context("Failed to resolve target address")?;

        // Try each resolved address until one connects
        let mut last_error = None;
        for addr in socket_addrs {
            match Self::try_connect_addr(addr, connect_timeout).await {
                Ok(stream) => {
                    let session = Self::from_stream(stream, addr);
                    info!(
                        session_id = %session.session_id,
                        "Connected to {} ({}:{})", addr, host, port
                    );
                    return Ok(session);
                }
                Err(e) => {
                    warn!("Failed to connect to {}: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(anyhow!("Failed to connect to {}:{}: {}", host, port, e)),
            None => Err(anyhow!(
                "Failed to connect to {}:{}: no addresses resolved",
                host,
                port
            )),
        }
    }

    fn from_stream(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            session_id: Uuid::new_v4().to_string(),
            peer_addr,
            opened_at: Instant::now(),
            connected: AtomicBool::new(true),
            reader: Mutex::new(read_half),
            writer: Mutex::new(write_half),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        }
    }

    /// Resolve host to socket addresses, bounding DNS by the same timeout
    async fn resolve_addrs(
        host: &str,
        port: u16,
        resolve_timeout: Duration,
    ) -> Result<Vec<SocketAddr>> {
        // Literal IPs skip the resolver entirely.
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, port)]);
        }

        let host_port = format!("{}:{}", host, port);
        match timeout(resolve_timeout, lookup_host(host_port)).await {
            Ok(Ok(addrs)) => {
                let resolved: Vec<SocketAddr> = addrs.collect();
                if resolved.is_empty() {
                    return Err(anyhow!("DNS resolution returned no addresses for {}", host));
                }
                debug!("Resolved {} to {} addresses", host, resolved.len());
                Ok(resolved)
            }
            Ok(Err(e)) => Err(anyhow!("DNS resolution failed for {}: {}", host, e)),
            Err(_) => Err(anyhow!("DNS resolution timed out for {}", host)),
        }
    }

    async fn try_connect_addr(addr: SocketAddr, connect_timeout: Duration) -> Result<TcpStream> {
        match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(anyhow!("Connection failed: {}", e)),
            Err(_) => Err(anyhow!("Connection timed out after {:?}", connect_timeout)),
        }
    }

    /// Write the full payload to the socket under a bounded deadline.
    ///
    /// Transport failures are reported, never retried, by this layer.
    pub async fn send(&self, bytes: &[u8], write_timeout: Duration) -> Result<()> {
        if !self.is_connected() {
            bail!("Socket not connected");
        }

        let mut writer = self.writer.lock().await;
        let write = async {
            writer.write_all(bytes).await?;
            writer.flush().await?;
            Ok::<(), std::io::Error>(())
        };

        match timeout(write_timeout, write).await {
            Ok(Ok(())) => {
                self.bytes_sent
                    .fetch_add(bytes.len() as u64, Ordering::Relaxed);
                debug!(
                    session_id = %self.session_id,
                    "Sent {} bytes to {}", bytes.len(), self.peer_addr
                );
                Ok(())
            }
            Ok(Err(e)) => {
                self.connected.store(false, Ordering::Relaxed);
                Err(anyhow!("Write to {} failed: {}", self.peer_addr, e))
            }
            Err(_) => {
                // The cancelled write may have left a partial payload on
                // the wire; the stream offset is unknown, so no further
                // sends can be allowed on this session.
                self.connected.store(false, Ordering::Relaxed);
                Err(anyhow!(
                    "Write to {} timed out after {:?}",
                    self.peer_addr,
                    write_timeout
                ))
            }
        }
    }

    /// Read up to `max_len` bytes, waiting at most `read_timeout`.
    ///
    /// Timeout, peer close, and transport errors all yield an empty
    /// payload rather than an error, so read-polling callers can treat
    /// "" as "nothing arrived yet". Only an invalid handle is an error,
    /// and that is the registry's job to reject.
    pub async fn read(&self, max_len: usize, read_timeout: Duration) -> Bytes {
        if !self.is_connected() {
            debug!(session_id = %self.session_id, "Read on closed session, returning empty");
            return Bytes::new();
        }

        let mut buf = vec![0u8; max_len];
        let mut reader = self.reader.lock().await;

        match timeout(read_timeout, reader.read(&mut buf)).await {
            Ok(Ok(0)) => {
                debug!(
                    session_id = %self.session_id,
                    "Peer {} closed the connection", self.peer_addr
                );
                self.connected.store(false, Ordering::Relaxed);
                Bytes::new()
            }
            Ok(Ok(n)) => {
                buf.truncate(n);
                self.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
                debug!(
                    session_id = %self.session_id,
                    "Read {} bytes from {}", n, self.peer_addr
                );
                Bytes::from(buf)
            }
            Ok(Err(e)) => {
                warn!(
                    session_id = %self.session_id,
                    "Read from {} failed: {}", self.peer_addr, e
                );
                self.connected.store(false, Ordering::Relaxed);
                Bytes::new()
            }
            Err(_) => {
                debug!(
                    session_id = %self.session_id,
                    "Read from {} timed out after {:?}", self.peer_addr, read_timeout
                );
                Bytes::new()
            }
        }
    }

    /// Close the underlying socket. Safe to call repeatedly; only the
    /// first call performs the shutdown.
    pub async fn close(&self) {
        if self.connected.swap(false, Ordering::Relaxed) {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.shutdown().await {
                debug!(
                    session_id = %self.session_id,
                    "Shutdown of {} reported: {}", self.peer_addr, e
                );
            }
            info!(
                session_id = %self.session_id,
                "Closed connection to {} after {:?} ({} bytes sent, {} bytes received)",
                self.peer_addr,
                self.duration(),
                self.bytes_sent(),
                self.bytes_received()
            );
        }
    }

    /// Whether the socket is still considered connected
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Remote address of this session
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Correlation ID for log lines
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Time since the connection was established
    pub fn duration(&self) -> Duration {
        self.opened_at.elapsed()
    }

    /// Total bytes written to the socket
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Total bytes read from the socket
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("session_id", &self.session_id)
            .field("peer_addr", &self.peer_addr)
            .field("connected", &self.is_connected())
            .finish()
    }
}
