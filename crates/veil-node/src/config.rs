//! Network settings shared by every node of a local overlay.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use veil_onion::CIRCUIT_HOPS;
use veil_transport::RpcClient;
use veil_types::layout::{DEFAULT_REGISTRY_PORT, DEFAULT_ROUTER_BASE_PORT, DEFAULT_USER_BASE_PORT};
use veil_types::PortLayout;

/// `[network]` section of the daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Host every node binds to and is reached at.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_registry_port")]
    pub registry_port: u16,
    /// Router `n` listens on `router_base_port + n`.
    #[serde(default = "default_router_base_port")]
    pub router_base_port: u16,
    /// User `n` listens on `user_base_port + n`.
    #[serde(default = "default_user_base_port")]
    pub user_base_port: u16,
    /// Number of onion routers to launch.
    #[serde(default = "default_router_count")]
    pub router_count: u32,
    /// Number of users to launch.
    #[serde(default = "default_user_count")]
    pub user_count: u32,
    /// Per-call timeout for node-to-node requests.
    ///
    /// A relay answers only once its own forward has answered, so the call
    /// into the circuit entry spans every hop. Routers do not know their
    /// position and use this value as is; the sender uses
    /// [`sender_timeout`](NetworkConfig::sender_timeout) instead.
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
    /// Serve `get_private_key` on routers. Debugging only.
    #[serde(default)]
    pub expose_private_keys: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_registry_port() -> u16 {
    DEFAULT_REGISTRY_PORT
}

fn default_router_base_port() -> u16 {
    DEFAULT_ROUTER_BASE_PORT
}

fn default_user_base_port() -> u16 {
    DEFAULT_USER_BASE_PORT
}

fn default_router_count() -> u32 {
    10
}

fn default_user_count() -> u32 {
    2
}

fn default_rpc_timeout_ms() -> u64 {
    10_000
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            registry_port: default_registry_port(),
            router_base_port: default_router_base_port(),
            user_base_port: default_user_base_port(),
            router_count: default_router_count(),
            user_count: default_user_count(),
            rpc_timeout_ms: default_rpc_timeout_ms(),
            expose_private_keys: false,
        }
    }
}

impl NetworkConfig {
    pub fn layout(&self) -> PortLayout {
        PortLayout {
            registry_port: self.registry_port,
            router_base_port: self.router_base_port,
            user_base_port: self.user_base_port,
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Timeout for the sender's call into the circuit entry: one
    /// `rpc_timeout` per relay plus one for the recipient.
    pub fn sender_timeout(&self) -> Duration {
        self.rpc_timeout().saturating_mul(CIRCUIT_HOPS as u32 + 1)
    }

    /// Client for calls between nodes of this network.
    pub fn client(&self) -> RpcClient {
        RpcClient::new(self.host.clone(), self.rpc_timeout())
    }

    /// Client a user forwards new onions with.
    pub fn sender_client(&self) -> RpcClient {
        RpcClient::new(self.host.clone(), self.sender_timeout())
    }
}
