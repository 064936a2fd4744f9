use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use camrelay::{RegistryConfig, RelayServer, ServerConfig};

/// Relay between capture devices and viewer clients
#[derive(Debug, Parser)]
#[command(name = "camrelay", version, about)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "CAMRELAY_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    #[arg(long, env = "CAMRELAY_MAX_CONNECTIONS", default_value_t = 0)]
    max_connections: usize,

    /// Outbound queue capacity per connection
    #[arg(long, env = "CAMRELAY_QUEUE_CAPACITY", default_value_t = 256)]
    queue_capacity: usize,

    /// How long a fan-out waits on a full queue, in milliseconds
    #[arg(long, env = "CAMRELAY_DELIVERY_TIMEOUT_MS", default_value_t = 5000)]
    delivery_timeout_ms: u64,

    /// Largest accepted WebSocket message in bytes
    #[arg(long, env = "CAMRELAY_MAX_MESSAGE_SIZE", default_value_t = 16 * 1024 * 1024)]
    max_message_size: usize,

    /// Query parameter carrying the role hint
    #[arg(long, env = "CAMRELAY_ROLE_PARAM", default_value = "type")]
    role_param: String,

    /// Role hint identifying capture devices
    #[arg(long, env = "CAMRELAY_PRODUCER_HINT", default_value = "raspberrypi")]
    producer_hint: String,

    /// Role hint identifying viewer clients
    #[arg(long, env = "CAMRELAY_CONSUMER_HINT", default_value = "flutter")]
    consumer_hint: String,

    /// Seconds between stats log lines (0 disables)
    #[arg(long, env = "CAMRELAY_STATS_INTERVAL_SECS", default_value_t = 30)]
    stats_interval_secs: u64,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        let registry = RegistryConfig::default()
            .producer_hint(self.producer_hint.as_str())
            .consumer_hint(self.consumer_hint.as_str());

        ServerConfig::with_addr(self.bind)
            .max_connections(self.max_connections)
            .outbound_queue_capacity(self.queue_capacity)
            .delivery_timeout(Duration::from_millis(self.delivery_timeout_ms))
            .max_message_size(self.max_message_size)
            .role_param(self.role_param.as_str())
            .registry(registry)
            .stats_interval(Duration::from_secs(self.stats_interval_secs))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("camrelay=info")),
        )
        .init();

    let cli = Cli::parse();
    let server = RelayServer::new(cli.server_config());

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .with_context(|| format!("relay server on {} failed", server.bind_addr()))?;

    Ok(())
}
