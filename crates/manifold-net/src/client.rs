//! Per-role RPC clients.
//!
//! Each remote role gets a narrow client ([`BackendClient`],
//! [`ValueClient`], [`AdminClient`]) rather than one wide surface. Every
//! call opens its own connection and drops it on every exit path — there
//! is no pooling, mirroring the one-connection-per-call discipline of the
//! backends these clients talk to.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use uuid::Uuid;

use manifold_types::{BackendInfo, ExecutionEvent, FinalOutcome, NamedValue, Pipeline};

use crate::chunk::{split_value, ValueAssembler};
use crate::error::{NetError, Result};
use crate::frame::{read_message, write_message};
use crate::messages::{ChunkFrame, Reply, Request};

// ── Connection ───────────────────────────────────────────────────────────────

/// A single framed RPC connection. Closed when dropped.
pub struct Connection {
    stream: TcpStream,
}

impl Connection {
    pub async fn open(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self { stream })
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn send<M: Serialize>(&mut self, msg: &M) -> Result<()> {
        write_message(&mut self.stream, msg).await
    }

    pub async fn recv<M: DeserializeOwned>(&mut self) -> Result<M> {
        read_message(&mut self.stream).await
    }
}

fn unexpected(reply: &Reply) -> NetError {
    NetError::Protocol(format!("unexpected reply: {reply:?}"))
}

// ── Backend client ───────────────────────────────────────────────────────────

/// Client for the pipeline execution surface of one backend (or of the
/// orchestrator itself, which exposes the same surface).
pub struct BackendClient {
    addr: String,
}

impl BackendClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Capability query: which pipeline parts can this node run.
    pub async fn backend_info(&self) -> Result<BackendInfo> {
        let mut conn = Connection::open(&self.addr).await?;
        conn.send(&Request::GetBackendInfo).await?;
        match conn.recv::<Reply>().await? {
            Reply::Info(info) => Ok(info),
            Reply::Error(e) => Err(NetError::Remote(e)),
            other => Err(unexpected(&other)),
        }
    }

    /// Run a pipeline, forwarding partial-result events into `partials` as
    /// they arrive. Returns the stream's terminal outcome without
    /// forwarding it — the caller decides how the terminal is surfaced.
    pub async fn execute_pipeline(
        &self,
        pipeline: Pipeline,
        initial_value_ids: Vec<Uuid>,
        partials: &mpsc::Sender<ExecutionEvent>,
    ) -> Result<FinalOutcome> {
        let mut conn = Connection::open(&self.addr).await?;
        conn.send(&Request::ExecutePipeline {
            pipeline,
            initial_value_ids,
        })
        .await?;

        loop {
            match conn.recv::<Reply>().await? {
                Reply::Event(ExecutionEvent::Partial(partial)) => {
                    partials
                        .send(ExecutionEvent::Partial(partial))
                        .await
                        .map_err(|_| NetError::Protocol("event sink closed".into()))?;
                }
                Reply::Event(ExecutionEvent::Final(outcome)) => return Ok(outcome),
                Reply::Error(e) => return Err(NetError::Remote(e)),
                other => return Err(unexpected(&other)),
            }
        }
    }

    /// Look up one named result value id of a completed execution.
    pub async fn execution_value(&self, execution_id: Uuid, key: &str) -> Result<Uuid> {
        let mut conn = Connection::open(&self.addr).await?;
        conn.send(&Request::GetExecutionValue {
            execution_id,
            key: key.to_string(),
        })
        .await?;
        match conn.recv::<Reply>().await? {
            Reply::ValueId(id) => Ok(id),
            Reply::Error(e) => Err(NetError::Remote(e)),
            other => Err(unexpected(&other)),
        }
    }

    /// Look up all result value ids of a completed execution.
    pub async fn all_execution_values(&self, execution_id: Uuid) -> Result<Vec<Uuid>> {
        let mut conn = Connection::open(&self.addr).await?;
        conn.send(&Request::GetAllExecutionValues { execution_id })
            .await?;
        match conn.recv::<Reply>().await? {
            Reply::ValueIds(ids) => Ok(ids),
            Reply::Error(e) => Err(NetError::Remote(e)),
            other => Err(unexpected(&other)),
        }
    }

    /// Drop a completed execution's record. Idempotent.
    pub async fn drop_execution_result(&self, execution_id: Uuid) -> Result<()> {
        let mut conn = Connection::open(&self.addr).await?;
        conn.send(&Request::DropExecutionResult { execution_id })
            .await?;
        match conn.recv::<Reply>().await? {
            Reply::Ok => Ok(()),
            Reply::Error(e) => Err(NetError::Remote(e)),
            other => Err(unexpected(&other)),
        }
    }
}

// ── Value client ─────────────────────────────────────────────────────────────

/// Client for the context value store of one node.
pub struct ValueClient {
    addr: String,
}

impl ValueClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Push a value into the remote store via the chunked transfer
    /// protocol. Returns the id the remote store minted for it.
    pub async fn set_value(&self, value: &NamedValue) -> Result<Uuid> {
        let mut conn = Connection::open(&self.addr).await?;
        conn.send(&Request::SetValue).await?;
        for chunk in split_value(value) {
            conn.send(&ChunkFrame::Chunk(chunk)).await?;
        }
        conn.send(&ChunkFrame::End).await?;

        match conn.recv::<Reply>().await? {
            Reply::ValueId(id) => Ok(id),
            Reply::Error(e) => Err(NetError::Remote(e)),
            other => Err(unexpected(&other)),
        }
    }

    /// Pull a value out of the remote store, reassembling its chunks.
    pub async fn get_value(&self, value_id: Uuid) -> Result<NamedValue> {
        let mut conn = Connection::open(&self.addr).await?;
        conn.send(&Request::GetValue { value_id }).await?;

        let mut assembler = ValueAssembler::new();
        loop {
            match conn.recv::<Reply>().await? {
                Reply::Chunk(chunk) => assembler.push(chunk),
                Reply::ChunkEnd => return Ok(assembler.finish()),
                Reply::Error(e) => return Err(NetError::Remote(e)),
                other => return Err(unexpected(&other)),
            }
        }
    }

    /// Remove values from the remote store. Unknown ids are ignored.
    pub async fn drop_values(&self, value_ids: Vec<Uuid>) -> Result<()> {
        let mut conn = Connection::open(&self.addr).await?;
        conn.send(&Request::DropValues { value_ids }).await?;
        match conn.recv::<Reply>().await? {
            Reply::Ok => Ok(()),
            Reply::Error(e) => Err(NetError::Remote(e)),
            other => Err(unexpected(&other)),
        }
    }
}

// ── Admin client ─────────────────────────────────────────────────────────────

/// Client for the administrative surface of the orchestrator.
pub struct AdminClient {
    addr: String,
}

impl AdminClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Pin the orchestrator's registry to a fixed part-to-backends map,
    /// permanently disabling discovery for the life of the process.
    pub async fn set_backend_map(
        &self,
        mapping: std::collections::HashMap<String, Vec<String>>,
    ) -> Result<()> {
        let mut conn = Connection::open(&self.addr).await?;
        conn.send(&Request::SetBackendMap { mapping }).await?;
        match conn.recv::<Reply>().await? {
            Reply::Ok => Ok(()),
            Reply::Error(e) => Err(NetError::Remote(e)),
            other => Err(unexpected(&other)),
        }
    }
}
