//! tcplink Library
//!
//! Host-addressable TCP client manager: open multiple outbound TCP
//! connections, send encoded byte payloads, perform bounded-time reads,
//! and close connections, with each connection referenced by a stable
//! integer handle rather than a live object reference.

pub mod codec;
pub mod config;
pub mod registry;
pub mod session;

pub use codec::Encoding;
pub use config::Config;
pub use registry::ClientRegistry;
pub use session::ClientSession;

/// Common error type for the client manager
pub type Result<T> = anyhow::Result<T>;
