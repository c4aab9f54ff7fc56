//! One-shot JSON-RPC calls.

use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::rpc::{RpcRequest, RpcResponse};
use crate::{Result, TransportError};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Calls methods on nodes hosted at `host`.
///
/// Every call opens a fresh connection, sends one request and waits for
/// exactly one response line.
#[derive(Clone, Debug)]
pub struct RpcClient {
    host: String,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(host: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            timeout,
        }
    }

    /// Client for `127.0.0.1` with [`DEFAULT_TIMEOUT`].
    pub fn localhost() -> Self {
        Self::new("127.0.0.1", DEFAULT_TIMEOUT)
    }

    /// Call `method` on the node listening at `port`.
    ///
    /// A JSON-RPC error reply becomes [`TransportError::Remote`].
    pub async fn call(&self, port: u16, method: &str, params: Value) -> Result<Value> {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        tokio::time::timeout(self.timeout, self.call_inner(port, method, params))
            .await
            .map_err(|_| TransportError::Timeout(timeout_ms))?
    }

    async fn call_inner(&self, port: u16, method: &str, params: Value) -> Result<Value> {
        let id = Value::from(rand::random::<u32>());
        let request = RpcRequest::new(id.clone(), method, params);

        let stream = TcpStream::connect((self.host.as_str(), port))
            .await
            .map_err(|e| TransportError::Connection(format!("{}:{port}: {e}", self.host)))?;
        let (reader, mut writer) = stream.into_split();

        let mut line = serde_json::to_string(&request)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;

        let mut reader = BufReader::new(reader);
        let mut reply = String::new();
        if reader.read_line(&mut reply).await? == 0 {
            return Err(TransportError::Connection(format!(
                "{}:{port} closed before replying",
                self.host
            )));
        }

        let response: RpcResponse = serde_json::from_str(&reply)?;
        if response.id != id {
            return Err(TransportError::Internal(format!(
                "response id {} does not match request id {id}",
                response.id
            )));
        }

        debug!(port, method, "RPC call answered");

        match (response.result, response.error) {
            (_, Some(error)) => Err(TransportError::Remote {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}
