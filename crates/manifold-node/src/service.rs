//! The orchestrator's RPC surface.
//!
//! [`OrchestratorService`] dispatches every [`Request`] variant against the
//! engine. It exposes the same wire surface as a backend (capability query,
//! pipeline execution, value store) plus the administrative registry pin,
//! so a client cannot tell an orchestrator from a plain backend — which is
//! what lets orchestrators be layered.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use manifold_engine::{
    create_plan, BackendConnector, BackendRegistry, PipelineExecutor, RpcConnector,
};
use manifold_net::{split_value, ChunkFrame, Connection, Reply, Request, RpcHandler, ValueAssembler};
use manifold_types::{BackendInfo, NodeConfig};

/// Node name reported to capability queries.
pub const ORCHESTRATOR_NAME: &str = "manifold-orchestrator";

/// Bound on buffered execution events between the executor task and the
/// connection writer. Backpressure, not a correctness limit.
const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct OrchestratorService {
    config: NodeConfig,
    registry: BackendRegistry,
    connector: Arc<dyn BackendConnector>,
    executor: Arc<PipelineExecutor>,
}

impl OrchestratorService {
    /// Production wiring: framed-TCP connector, fresh session store.
    pub fn new(config: NodeConfig) -> Self {
        let connector: Arc<dyn BackendConnector> = Arc::new(RpcConnector);
        let executor = Arc::new(PipelineExecutor::new(
            connector.clone(),
            Arc::new(manifold_engine::ValueStore::new()),
        ));
        Self {
            config,
            registry: BackendRegistry::new(),
            connector,
            executor,
        }
    }

    /// Refresh the registry from the configured fleet. No-op once pinned.
    async fn refresh_registry(&self) -> anyhow::Result<()> {
        self.registry
            .update(&self.config.backends, &self.connector)
            .await?;
        Ok(())
    }

    async fn execute_pipeline(
        &self,
        conn: &mut Connection,
        pipeline: manifold_types::Pipeline,
        initial_value_ids: Vec<uuid::Uuid>,
    ) -> anyhow::Result<()> {
        self.refresh_registry().await?;
        let plan = create_plan(&self.registry, &pipeline)?;
        info!(%plan, steps = pipeline.parts.len(), "execution plan created");

        // The executor runs in its own task and owns the sender, so the
        // event stream closes exactly when execution ends. If the client
        // goes away the writer below fails, the receiver drops, and the
        // executor's next relay attempt aborts the run.
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let executor = self.executor.clone();
        tokio::spawn(async move {
            let _ = executor.execute(&plan, initial_value_ids, tx).await;
        });

        while let Some(event) = rx.recv().await {
            conn.send(&Reply::Event(event)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RpcHandler for OrchestratorService {
    async fn handle(&self, request: Request, conn: &mut Connection) -> anyhow::Result<()> {
        match request {
            Request::ExecutePipeline {
                pipeline,
                initial_value_ids,
            } => {
                self.execute_pipeline(conn, pipeline, initial_value_ids)
                    .await?;
            }

            Request::GetBackendInfo => {
                self.refresh_registry().await?;
                conn.send(&Reply::Info(BackendInfo {
                    name: ORCHESTRATOR_NAME.to_string(),
                    pipeline_parts: self.registry.part_names(),
                }))
                .await?;
            }

            Request::GetExecutionValue { execution_id, key } => {
                let record = self
                    .executor
                    .get_context_values(execution_id)
                    .ok_or_else(|| anyhow::anyhow!("unknown execution {execution_id}"))?;
                let id = record
                    .get(&key)
                    .ok_or_else(|| anyhow::anyhow!("execution {execution_id} has no value {key}"))?;
                conn.send(&Reply::ValueId(*id)).await?;
            }

            Request::GetAllExecutionValues { execution_id } => {
                let record = self
                    .executor
                    .get_context_values(execution_id)
                    .ok_or_else(|| anyhow::anyhow!("unknown execution {execution_id}"))?;
                let ids: Vec<_> = record.values().copied().collect();
                conn.send(&Reply::ValueIds(ids)).await?;
            }

            Request::DropExecutionResult { execution_id } => {
                self.executor.drop_execution_result(execution_id);
                conn.send(&Reply::Ok).await?;
            }

            Request::SetValue => {
                let mut assembler = ValueAssembler::new();
                loop {
                    match conn.recv::<ChunkFrame>().await? {
                        ChunkFrame::Chunk(chunk) => assembler.push(chunk),
                        ChunkFrame::End => break,
                    }
                }
                let id = self.executor.session_store().put(assembler.finish());
                conn.send(&Reply::ValueId(id)).await?;
            }

            Request::GetValue { value_id } => {
                let value = self
                    .executor
                    .session_store()
                    .get(value_id)
                    .ok_or_else(|| anyhow::anyhow!("unknown context value {value_id}"))?;
                for chunk in split_value(&value) {
                    conn.send(&Reply::Chunk(chunk)).await?;
                }
                conn.send(&Reply::ChunkEnd).await?;
            }

            Request::DropValues { value_ids } => {
                for id in value_ids {
                    self.executor.session_store().remove(id);
                }
                conn.send(&Reply::Ok).await?;
            }

            Request::SetBackendMap { mapping } => {
                info!(parts = mapping.len(), "pinning backend registry");
                self.registry.set_pinned(mapping);
                conn.send(&Reply::Ok).await?;
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
