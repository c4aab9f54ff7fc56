//! Line-delimited JSON-RPC server over TCP.
//!
//! Each accepted connection is served by its own task; requests on one
//! connection are answered in order.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::rpc::{RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION};
use crate::Result;

/// Longest request line accepted, newline included. A longer line gets a
/// parse error and the connection is closed.
pub const MAX_LINE_LEN: usize = 1 << 20;

/// Service-side method dispatch.
pub trait RpcHandler: Send + Sync + 'static {
    /// Answer one call. Errors are sent back to the caller as-is.
    fn handle(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = std::result::Result<Value, RpcError>> + Send;
}

/// A bound listener waiting for [`run`](Self::run).
pub struct RpcServer {
    listener: TcpListener,
}

impl RpcServer {
    /// Bind to `addr`. Port 0 picks a free port.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever.
    pub async fn run<H: RpcHandler>(self, handler: Arc<H>) -> Result<()> {
        info!(addr = ?self.listener.local_addr().ok(), "RPC server listening");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(handler, stream).await {
                            warn!(%peer, "Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

async fn handle_connection<H: RpcHandler>(handler: Arc<H>, stream: TcpStream) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        let bytes_read = (&mut reader)
            .take(MAX_LINE_LEN as u64 + 1)
            .read_until(b'\n', &mut line)
            .await?;
        if bytes_read == 0 {
            break; // EOF
        }
        let oversized = bytes_read > MAX_LINE_LEN;

        let response = if oversized {
            warn!(limit = MAX_LINE_LEN, "Request line too long, closing connection");
            RpcResponse::error(Value::Null, RpcError::parse_error())
        } else {
            match serde_json::from_slice::<RpcRequest>(&line) {
                Ok(request) => dispatch_request(handler.as_ref(), request).await,
                Err(_) => RpcResponse::error(Value::Null, RpcError::parse_error()),
            }
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;

        if oversized {
            break;
        }
    }

    Ok(())
}

async fn dispatch_request<H: RpcHandler>(handler: &H, request: RpcRequest) -> RpcResponse {
    let id = request.id;
    if request.jsonrpc != JSONRPC_VERSION {
        return RpcResponse::error(id, RpcError::invalid_request());
    }

    debug!("Dispatching RPC method: {}", request.method);

    match handler.handle(&request.method, request.params).await {
        Ok(result) => RpcResponse::success(id, result),
        Err(e) => RpcResponse::error(id, e),
    }
}
