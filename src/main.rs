//! tcplink - Host-addressable TCP client manager
//!
//! Thin command-line adapter over the client registry: opens a
//! connection, optionally sends an encoded payload and performs a
//! bounded read, then disconnects. Each step's result is printed as a
//! JSON object, matching the payload shapes the library hands back to
//! any adapter layer.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tcplink::config::ConfigManager;
use tcplink::registry::{ConnectResponse, DisconnectResponse, ReadResponse};
use tcplink::{codec, ClientRegistry, Encoding};

/// CLI arguments for tcplink
#[derive(Parser, Debug)]
#[command(name = "tcplink")]
#[command(about = "tcplink - Host-addressable TCP client manager")]
#[command(version)]
#[command(long_about = "
tcplink - Host-addressable TCP client manager

Opens an outbound TCP connection, optionally sends an encoded payload
(utf8, base64, or hex) and reads a bounded-time response, then closes
the connection. Results are printed as JSON objects.

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file
3. Environment variables
4. Built-in defaults

Environment variables:
  TCPLINK_DEFAULT_PORT     - Port used when --port is omitted
  TCPLINK_CONNECT_TIMEOUT  - Connect timeout (e.g., 10s, 1m)
  TCPLINK_READ_TIMEOUT     - Read timeout (e.g., 10s)
  TCPLINK_WRITE_TIMEOUT    - Write deadline (e.g., 10s)
  TCPLINK_MAX_READ_LEN     - Default bounded-read length in bytes
  TCPLINK_LOG_LEVEL        - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Host or IP address to connect to
    pub host: Option<String>,

    /// Port to connect to (default 9100)
    #[arg(short, long, help = "Port to connect to")]
    pub port: Option<u16>,

    /// Payload encoding: utf8, base64, or hex
    #[arg(short, long, default_value = "utf8", help = "Payload encoding")]
    pub encoding: String,

    /// Payload to send after connecting
    #[arg(short, long, help = "Payload to send after connecting")]
    pub data: Option<String>,

    /// Perform a bounded read after sending
    #[arg(short, long, help = "Perform a bounded read after sending")]
    pub read: bool,

    /// Maximum number of bytes to read
    #[arg(long, help = "Maximum number of bytes to read")]
    pub expect_len: Option<usize>,

    /// Read timeout in seconds
    #[arg(short, long, help = "Read timeout in seconds")]
    pub timeout: Option<u64>,

    /// Connect timeout in seconds
    #[arg(long, help = "Connect timeout in seconds")]
    pub connect_timeout: Option<u64>,

    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "config.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the
    /// config file and TCPLINK_LOG_LEVEL
    #[arg(long, help = "Log level")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Load configuration with priority: CLI args > config file > environment > defaults
    let mut config = if args.config.exists() {
        ConfigManager::load_from_file(&args.config)?
    } else {
        ConfigManager::load_from_env()?
    };

    // Apply CLI argument overrides (highest priority)
    if let Some(secs) = args.connect_timeout {
        config.client.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.timeout {
        config.client.read_timeout = Duration::from_secs(secs);
    }
    if let Some(len) = args.expect_len {
        config.client.max_read_len = len;
    }

    config
        .validate()
        .context("Final configuration validation failed")?;

    // The subscriber is built only after the config is loaded so that
    // [log] level and TCPLINK_LOG_LEVEL are honored; CLI flags still win.
    let log_level = if args.verbose {
        "debug".to_string()
    } else {
        args.log_level.clone().unwrap_or_else(|| config.log.level.clone())
    };
    init_tracing(&log_level)?;

    debug!("Starting tcplink v{}", env!("CARGO_PKG_VERSION"));

    if args.validate_config {
        info!("Configuration is valid");
        info!("  Default port: {}", config.client.default_port);
        info!("  Connect timeout: {:?}", config.client.connect_timeout);
        info!("  Read timeout: {:?}", config.client.read_timeout);
        info!("  Write timeout: {:?}", config.client.write_timeout);
        info!("  Max read length: {} bytes", config.client.max_read_len);
        return Ok(());
    }

    let host = args
        .host
        .as_deref()
        .context("Must provide ip address to connect")?;
    let port = args.port.unwrap_or(config.client.default_port);
    let encoding: Encoding = args.encoding.parse()?;

    let registry = ClientRegistry::new(config.client.clone());

    // Connect
    let handle = registry.connect(host, port, None).await?;
    println!(
        "{}",
        serde_json::to_string(&ConnectResponse { client: handle })?
    );

    // Send, if a payload was given
    if let Some(data) = &args.data {
        let payload = codec::decode(data, encoding)?;
        registry.send(handle, &payload).await?;
        info!("Sent {} bytes ({} payload)", payload.len(), encoding);
    }

    // Bounded read, if requested
    if args.read {
        let bytes = registry.read(handle, None, None).await?;
        let response = ReadResponse {
            result: codec::encode(&bytes),
        };
        println!("{}", serde_json::to_string(&response)?);
    }

    // Disconnect
    let handle = registry.disconnect(handle).await?;
    println!(
        "{}",
        serde_json::to_string(&DisconnectResponse { client: handle })?
    );

    registry.close_all().await;
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();

    Ok(())
}
