//! Port layout of a local Veil deployment.
//!
//! Every node is reachable on the deployment host at a port derived from its
//! id. Those ports double as the onion next-hop addresses.

use serde::{Deserialize, Serialize};

use crate::{NodeId, UserId};

/// Default registry port.
pub const DEFAULT_REGISTRY_PORT: u16 = 8080;

/// Default base port for onion routers (`router_base_port + node_id`).
pub const DEFAULT_ROUTER_BASE_PORT: u16 = 4000;

/// Default base port for users (`user_base_port + user_id`).
pub const DEFAULT_USER_BASE_PORT: u16 = 3000;

/// Where each kind of node listens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortLayout {
    pub registry_port: u16,
    pub router_base_port: u16,
    pub user_base_port: u16,
}

impl Default for PortLayout {
    fn default() -> Self {
        Self {
            registry_port: DEFAULT_REGISTRY_PORT,
            router_base_port: DEFAULT_ROUTER_BASE_PORT,
            user_base_port: DEFAULT_USER_BASE_PORT,
        }
    }
}

impl PortLayout {
    /// Address of the onion router with `node_id`.
    pub fn router_address(&self, node_id: NodeId) -> u64 {
        u64::from(self.router_base_port) + u64::from(node_id)
    }

    /// Address of the user with `user_id`.
    pub fn user_address(&self, user_id: UserId) -> u64 {
        u64::from(self.user_base_port) + u64::from(user_id)
    }
}
