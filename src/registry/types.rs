//! Registry response payloads and statistics

use serde::{Deserialize, Serialize};

/// Stable integer reference to a registry slot
pub type Handle = usize;

/// Payload returned to the caller after a successful connect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub client: Handle,
}

/// Payload returned to the caller after a read.
///
/// `result` is the UTF-8 rendering of whatever arrived; an empty string
/// means timeout, peer close, or non-UTF-8 data (soft failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResponse {
    pub result: String,
}

/// Payload returned to the caller after a disconnect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectResponse {
    pub client: Handle,
}

/// Aggregate registry statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Total slots ever allocated (slots are never recycled)
    pub total_slots: usize,
    /// Slots whose socket is still connected
    pub active_connections: usize,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}
