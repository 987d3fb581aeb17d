//! The seam between the engine and remote backends.
//!
//! The executor and registry never open sockets themselves — they speak
//! [`BackendConnector`], one capability method per remote operation.
//! [`RpcConnector`] is the production implementation over the
//! `manifold-net` per-role clients; tests substitute scripted fakes.

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use manifold_net::{BackendClient, ValueClient};
use manifold_types::{
    BackendInfo, ExecutionEvent, FinalOutcome, NamedValue, Pipeline, PipelinePartDescriptor,
};

use crate::error::Result;

#[async_trait]
pub trait BackendConnector: Send + Sync {
    /// Query a backend for its capability declaration.
    async fn backend_info(&self, addr: &str) -> Result<BackendInfo>;

    /// Push a value into the backend's store via the chunked transfer
    /// protocol; returns the id the backend minted for it.
    async fn send_value(&self, addr: &str, value: NamedValue) -> Result<Uuid>;

    /// Execute a run of steps on the backend, forwarding partial-result
    /// events into `events` as they arrive. The stream's terminal is
    /// returned, never forwarded — a success carries the backend's own
    /// completion id, which must not leak past the engine.
    async fn run_steps(
        &self,
        addr: &str,
        steps: Vec<PipelinePartDescriptor>,
        value_ids: Vec<Uuid>,
        events: &mpsc::Sender<ExecutionEvent>,
    ) -> Result<FinalOutcome>;

    /// Ids of the named output values a completion produced.
    async fn list_output_values(&self, addr: &str, completion_id: Uuid) -> Result<Vec<Uuid>>;

    /// Pull one output value out of the backend's store.
    async fn fetch_value(&self, addr: &str, value_id: Uuid) -> Result<NamedValue>;
}

// ── RPC implementation ───────────────────────────────────────────────────────

/// [`BackendConnector`] over the framed TCP protocol. Stateless: every
/// call opens its own scoped connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpcConnector;

#[async_trait]
impl BackendConnector for RpcConnector {
    async fn backend_info(&self, addr: &str) -> Result<BackendInfo> {
        Ok(BackendClient::new(addr).backend_info().await?)
    }

    async fn send_value(&self, addr: &str, value: NamedValue) -> Result<Uuid> {
        Ok(ValueClient::new(addr).set_value(&value).await?)
    }

    async fn run_steps(
        &self,
        addr: &str,
        steps: Vec<PipelinePartDescriptor>,
        value_ids: Vec<Uuid>,
        events: &mpsc::Sender<ExecutionEvent>,
    ) -> Result<FinalOutcome> {
        let outcome = BackendClient::new(addr)
            .execute_pipeline(Pipeline::new(steps), value_ids, events)
            .await?;
        Ok(outcome)
    }

    async fn list_output_values(&self, addr: &str, completion_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(BackendClient::new(addr)
            .all_execution_values(completion_id)
            .await?)
    }

    async fn fetch_value(&self, addr: &str, value_id: Uuid) -> Result<NamedValue> {
        Ok(ValueClient::new(addr).get_value(value_id).await?)
    }
}
