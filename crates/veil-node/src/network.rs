//! Launching a complete local overlay.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};
use veil_transport::{RpcHandler, RpcServer};
use veil_types::{NodeId, UserId};

use crate::config::NetworkConfig;
use crate::registry::{RegistryClient, RegistryService};
use crate::router::RouterNode;
use crate::user::UserNode;
use crate::{NodeError, Result};

/// Running services of a launched network.
pub struct NetworkHandle {
    registry: Arc<RegistryService>,
    routers: Vec<Arc<RouterNode>>,
    users: Vec<Arc<UserNode>>,
    tasks: Vec<JoinHandle<()>>,
}

impl NetworkHandle {
    pub fn registry(&self) -> &RegistryService {
        &self.registry
    }

    pub fn router(&self, node_id: NodeId) -> Option<&RouterNode> {
        self.routers
            .iter()
            .find(|r| r.node_id() == node_id)
            .map(Arc::as_ref)
    }

    pub fn user(&self, user_id: UserId) -> Option<&UserNode> {
        self.users
            .iter()
            .find(|u| u.user_id() == user_id)
            .map(Arc::as_ref)
    }

    pub fn router_count(&self) -> usize {
        self.routers.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Stop every service.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        info!(services = self.tasks.len(), "Network stopped");
    }
}

fn socket_addr(config: &NetworkConfig, port: u64) -> Result<SocketAddr> {
    let ip: IpAddr = config
        .host
        .parse()
        .map_err(|_| NodeError::Payload(format!("host {} is not an IP address", config.host)))?;
    let port = u16::try_from(port)
        .map_err(|_| NodeError::Payload(format!("port {port} is out of range")))?;
    Ok(SocketAddr::new(ip, port))
}

async fn serve<H: RpcHandler>(
    addr: SocketAddr,
    handler: Arc<H>,
    tasks: &mut Vec<JoinHandle<()>>,
) -> Result<()> {
    let server = RpcServer::bind(addr).await?;
    tasks.push(tokio::spawn(async move {
        if let Err(e) = server.run(handler).await {
            error!(%addr, "Server stopped: {}", e);
        }
    }));
    Ok(())
}

/// Start the registry, then every router, then every user.
///
/// Routers are numbered `0..router_count` and users `0..user_count`. Each
/// router has registered by the time this returns, so a user may send
/// immediately. On failure, services already started are stopped.
pub async fn launch_network(config: &NetworkConfig) -> Result<NetworkHandle> {
    let layout = config.layout();
    let mut handle = NetworkHandle {
        registry: Arc::new(RegistryService::new()),
        routers: Vec::new(),
        users: Vec::new(),
        tasks: Vec::new(),
    };

    match start_services(config, &mut handle).await {
        Ok(()) => {
            info!(
                registry_port = layout.registry_port,
                routers = handle.routers.len(),
                users = handle.users.len(),
                "Network launched"
            );
            Ok(handle)
        }
        Err(e) => {
            handle.shutdown();
            Err(e)
        }
    }
}

async fn start_services(config: &NetworkConfig, handle: &mut NetworkHandle) -> Result<()> {
    let layout = config.layout();

    let registry_addr = socket_addr(config, u64::from(layout.registry_port))?;
    serve(registry_addr, Arc::clone(&handle.registry), &mut handle.tasks).await?;

    let registry = RegistryClient::new(config.client(), layout.registry_port);
    for node_id in 0..config.router_count {
        let router = Arc::new(RouterNode::new(node_id, config));
        let addr = socket_addr(config, layout.router_address(node_id))?;
        serve(addr, Arc::clone(&router), &mut handle.tasks).await?;
        router.register(&registry).await?;
        handle.routers.push(router);
    }

    for user_id in 0..config.user_count {
        let user = Arc::new(UserNode::new(user_id, config));
        let addr = socket_addr(config, layout.user_address(user_id))?;
        serve(addr, Arc::clone(&user), &mut handle.tasks).await?;
        handle.users.push(user);
    }

    Ok(())
}
