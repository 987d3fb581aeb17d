//! RPC accept loop.
//!
//! One task per accepted connection: read the single [`Request`] frame,
//! hand it to the [`RpcHandler`] together with the connection (so handlers
//! can stream replies or read chunk frames), and report any handler error
//! back to the peer as a [`Reply::Error`] frame.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::client::Connection;
use crate::error::Result;
use crate::messages::{Reply, Request};

/// Dispatches one decoded request against a live connection.
///
/// Handlers own the rest of the exchange: streaming replies for `Execute`
/// and `GetValue`, reading chunk frames for `SetValue`, or a single reply
/// frame for unary calls.
#[async_trait]
pub trait RpcHandler: Send + Sync + 'static {
    async fn handle(&self, request: Request, conn: &mut Connection) -> anyhow::Result<()>;
}

/// Bind the orchestrator's listening socket.
pub async fn bind(listen_addr: &str) -> Result<TcpListener> {
    Ok(TcpListener::bind(listen_addr).await?)
}

/// Accept connections forever, spawning one task per connection.
pub async fn serve(listener: TcpListener, handler: Arc<dyn RpcHandler>) -> Result<()> {
    let local = listener.local_addr()?;
    info!(addr = %local, "rpc endpoint listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let handler = handler.clone();

        tokio::spawn(async move {
            let mut conn = Connection::from_stream(stream);
            match conn.recv::<Request>().await {
                Ok(request) => {
                    if let Err(e) = handler.handle(request, &mut conn).await {
                        warn!(%peer, error = %e, "request failed");
                        let _ = conn.send(&Reply::Error(e.to_string())).await;
                    }
                }
                Err(e) => warn!(%peer, error = %e, "failed to read request"),
            }
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
