//! The relay directory.
//!
//! Stores identities in registration order and serves them as one list.
//! Registering the same id twice keeps both entries; circuit selection
//! deduplicates by id.

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use veil_transport::{RpcClient, RpcError, RpcHandler};
use veil_types::{NodeRegistry, RelayIdentity};

use crate::{parse_params, success, to_result, Result};

/// In-memory registry service.
#[derive(Debug, Default)]
pub struct RegistryService {
    nodes: RwLock<Vec<RelayIdentity>>,
}

impl RegistryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a relay.
    pub async fn register(&self, identity: RelayIdentity) {
        info!(node_id = identity.node_id, "Relay registered");
        self.nodes.write().await.push(identity);
    }

    /// Every registered relay, in registration order.
    pub async fn list_all(&self) -> NodeRegistry {
        NodeRegistry {
            nodes: self.nodes.read().await.clone(),
        }
    }
}

impl RpcHandler for RegistryService {
    async fn handle(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError> {
        match method {
            "status" => Ok(Value::from("live")),
            "register_node" => {
                let identity: RelayIdentity = parse_params(params)?;
                self.register(identity).await;
                Ok(success())
            }
            "get_node_registry" => {
                let registry = self.list_all().await;
                debug!(nodes = registry.nodes.len(), "Serving registry");
                to_result(&registry)
            }
            _ => Err(RpcError::method_not_found(method)),
        }
    }
}

/// Calls a remote [`RegistryService`].
#[derive(Clone, Debug)]
pub struct RegistryClient {
    client: RpcClient,
    port: u16,
}

impl RegistryClient {
    pub fn new(client: RpcClient, port: u16) -> Self {
        Self { client, port }
    }

    pub async fn register(&self, identity: &RelayIdentity) -> Result<()> {
        self.client
            .call(self.port, "register_node", serde_json::to_value(identity)?)
            .await?;
        Ok(())
    }

    pub async fn fetch(&self) -> Result<NodeRegistry> {
        let value = self
            .client
            .call(self.port, "get_node_registry", Value::Null)
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use veil_transport::RpcServer;

    use super::*;

    fn identity(node_id: u32) -> RelayIdentity {
        RelayIdentity::from_key_bytes(node_id, &[node_id as u8; 32])
    }

    #[tokio::test]
    async fn test_registration_order_preserved() {
        let registry = RegistryService::new();
        registry.register(identity(3)).await;
        registry.register(identity(1)).await;
        registry.register(identity(3)).await;

        let ids: Vec<_> = registry
            .list_all()
            .await
            .nodes
            .iter()
            .map(|n| n.node_id)
            .collect();
        assert_eq!(ids, vec![3, 1, 3]);
    }

    #[tokio::test]
    async fn test_rpc_methods() {
        let registry = RegistryService::new();
        assert_eq!(
            registry.handle("status", Value::Null).await.expect("status"),
            "live"
        );

        let ack = registry
            .handle("register_node", serde_json::to_value(identity(5)).expect("json"))
            .await
            .expect("register");
        assert_eq!(ack["result"], "success");

        let listed = registry
            .handle("get_node_registry", Value::Null)
            .await
            .expect("list");
        assert_eq!(listed["nodes"][0]["node_id"], 5);

        let bad = registry
            .handle("register_node", serde_json::json!({"node_id": "x"}))
            .await;
        assert!(matches!(bad, Err(RpcError { code: -32602, .. })));
    }

    #[tokio::test]
    async fn test_client_against_server() {
        let service = Arc::new(RegistryService::new());
        let server = RpcServer::bind("127.0.0.1:0".parse().expect("addr"))
            .await
            .expect("bind");
        let port = server.local_addr().expect("addr").port();
        tokio::spawn(server.run(Arc::clone(&service)));

        let client = RegistryClient::new(RpcClient::localhost(), port);
        client.register(&identity(2)).await.expect("register");
        client.register(&identity(7)).await.expect("register");

        let fetched = client.fetch().await.expect("fetch");
        assert_eq!(fetched, service.list_all().await);
        assert_eq!(fetched.nodes.len(), 2);
    }
}
