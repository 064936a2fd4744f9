//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::hub::DEFAULT_ROLE_PARAM;
use crate::registry::RegistryConfig;
use crate::router::DEFAULT_DELIVERY_TIMEOUT;

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Capacity of each connection's outbound queue (at least 1 is used)
    pub outbound_queue_capacity: usize,

    /// How long a fan-out waits on one full outbound queue
    pub delivery_timeout: Duration,

    /// Largest accepted WebSocket message
    pub max_message_size: usize,

    /// Query parameter carrying the role hint
    pub role_param: String,

    /// Role classification
    pub registry: RegistryConfig,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Stats logging interval
    pub stats_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 0, // Unlimited
            outbound_queue_capacity: 256,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            max_message_size: 16 * 1024 * 1024, // 16MB
            role_param: DEFAULT_ROLE_PARAM.to_string(),
            registry: RegistryConfig::default(),
            tcp_nodelay: true, // Important for low latency
            stats_interval: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set outbound queue capacity (at least 1)
    pub fn outbound_queue_capacity(mut self, capacity: usize) -> Self {
        self.outbound_queue_capacity = capacity.max(1);
        self
    }

    /// Set the per-member delivery timeout
    pub fn delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Set the maximum message size
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the role query parameter
    pub fn role_param(mut self, param: impl Into<String>) -> Self {
        self.role_param = param.into();
        self
    }

    /// Set role classification
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Set the stats logging interval
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.outbound_queue_capacity, 256);
        assert_eq!(config.delivery_timeout, DEFAULT_DELIVERY_TIMEOUT);
        assert_eq!(config.role_param, "type");
        assert_eq!(config.registry.producer_hint, "raspberrypi");
        assert_eq!(config.registry.consumer_hint, "flutter");
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:5001".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 5001);
    }

    #[test]
    fn test_builder_queue_capacity_floor() {
        let config = ServerConfig::default().outbound_queue_capacity(0);

        assert_eq!(config.outbound_queue_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .outbound_queue_capacity(32)
            .delivery_timeout(Duration::from_millis(250))
            .max_message_size(1024)
            .role_param("role")
            .registry(RegistryConfig::default().consumer_hint("viewer"))
            .stats_interval(Duration::from_secs(5));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.outbound_queue_capacity, 32);
        assert_eq!(config.delivery_timeout, Duration::from_millis(250));
        assert_eq!(config.max_message_size, 1024);
        assert_eq!(config.role_param, "role");
        assert_eq!(config.registry.consumer_hint, "viewer");
        assert_eq!(config.stats_interval, Duration::from_secs(5));
    }
}
