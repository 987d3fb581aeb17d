//! Multi-hop pipeline execution.
//!
//! Walks an [`ExecutionPlan`] strictly sequentially — node *i+1*'s inputs
//! are exactly node *i*'s outputs, so there is nothing to parallelize
//! across nodes. For each node: transfer the working value set to the
//! node's backend, run its steps while relaying partial results to the
//! caller's sink as they arrive, then pull the outputs back and hand them
//! to the next node. Backend-local completion ids never leave this module;
//! the client-facing terminal always carries an orchestrator-minted
//! execution id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use manifold_types::{ExecutionEvent, FinalOutcome};

use crate::connector::BackendConnector;
use crate::error::{EngineError, Result};
use crate::planner::ExecutionPlan;
use crate::store::ValueStore;

pub struct PipelineExecutor {
    connector: Arc<dyn BackendConnector>,
    /// Long-lived store: client-submitted inputs and final-node outputs.
    session_store: Arc<ValueStore>,
    /// Completed executions: execution id → (value key → value id).
    executions: Mutex<HashMap<Uuid, HashMap<String, Uuid>>>,
}

impl PipelineExecutor {
    pub fn new(connector: Arc<dyn BackendConnector>, session_store: Arc<ValueStore>) -> Self {
        Self {
            connector,
            session_store,
            executions: Mutex::new(HashMap::new()),
        }
    }

    pub fn session_store(&self) -> &Arc<ValueStore> {
        &self.session_store
    }

    /// Drive a plan to completion.
    ///
    /// Owns `events`: zero or more partial events are pushed as they
    /// arrive from backends, followed by exactly one terminal event on
    /// every exit path; the stream closes when this call returns. An empty
    /// plan succeeds immediately with the nil execution id and performs no
    /// backend I/O.
    pub async fn execute(
        &self,
        plan: &ExecutionPlan,
        initial_value_ids: Vec<Uuid>,
        events: mpsc::Sender<ExecutionEvent>,
    ) -> Result<Uuid> {
        if plan.is_empty() {
            let _ = events
                .send(ExecutionEvent::Final(FinalOutcome::Success(Uuid::nil())))
                .await;
            return Ok(Uuid::nil());
        }

        match self.run_plan(plan, initial_value_ids, &events).await {
            Ok(execution_id) => {
                let _ = events
                    .send(ExecutionEvent::Final(FinalOutcome::Success(execution_id)))
                    .await;
                Ok(execution_id)
            }
            Err(e) => {
                // A remote failure terminal has already been relayed
                // verbatim; every other error still owes the sink its
                // single terminal event.
                if !matches!(e, EngineError::RemoteFailure(_)) {
                    let _ = events
                        .send(ExecutionEvent::Final(FinalOutcome::Error(e.to_string())))
                        .await;
                }
                warn!(error = %e, "pipeline execution failed");
                Err(e)
            }
        }
    }

    async fn run_plan(
        &self,
        plan: &ExecutionPlan,
        initial_value_ids: Vec<Uuid>,
        events: &mpsc::Sender<ExecutionEvent>,
    ) -> Result<Uuid> {
        let total = plan.nodes().len();
        let mut working_ids = initial_value_ids;
        let mut working_store = self.session_store.clone();

        for (index, node) in plan.nodes().iter().enumerate() {
            let last_node = index + 1 == total;

            info!(
                backend = node.backend(),
                node = index + 1,
                total,
                steps = node.steps().len(),
                "executing plan node"
            );

            // Transfer the working set in. A short-lived per-hop store
            // never outlives the hop it was created for: it is cleared
            // once the transfers have been issued, success or not.
            let transferred = self
                .transfer_values(node.backend(), &working_ids, &working_store)
                .await;
            if !Arc::ptr_eq(&working_store, &self.session_store) {
                working_store.clear();
            }
            let transferred = transferred?;

            let outcome = self
                .connector
                .run_steps(node.backend(), node.steps().to_vec(), transferred, events)
                .await?;
            let completion_id = match outcome {
                FinalOutcome::Success(id) => id,
                FinalOutcome::Error(message) => {
                    let _ = events
                        .send(ExecutionEvent::Final(FinalOutcome::Error(message.clone())))
                        .await;
                    return Err(EngineError::RemoteFailure(message));
                }
            };

            // Pull the node's outputs back. Final-node outputs go into the
            // session store so they survive for later client queries;
            // intermediate outputs go into a fresh per-hop store.
            let output_ids = self
                .connector
                .list_output_values(node.backend(), completion_id)
                .await?;
            let target = if last_node {
                self.session_store.clone()
            } else {
                Arc::new(ValueStore::new())
            };

            let mut key_to_id = HashMap::with_capacity(output_ids.len());
            let mut next_ids = Vec::with_capacity(output_ids.len());
            for output_id in output_ids {
                let value = self.connector.fetch_value(node.backend(), output_id).await?;
                let key = value.key.clone();
                let local_id = target.put(value);
                key_to_id.insert(key, local_id);
                next_ids.push(local_id);
            }

            if last_node {
                let execution_id = Uuid::now_v7();
                self.executions
                    .lock()
                    .unwrap()
                    .insert(execution_id, key_to_id);
                info!(%execution_id, "pipeline execution completed");
                return Ok(execution_id);
            }

            working_ids = next_ids;
            working_store = target;
        }

        Err(EngineError::MalformedPipeline(
            "execution plan has no nodes".into(),
        ))
    }

    async fn transfer_values(
        &self,
        backend: &str,
        value_ids: &[Uuid],
        store: &ValueStore,
    ) -> Result<Vec<Uuid>> {
        let mut transferred = Vec::with_capacity(value_ids.len());
        for id in value_ids {
            let value = store
                .get(*id)
                .ok_or_else(|| EngineError::NotFound(format!("context value {id}")))?;
            transferred.push(self.connector.send_value(backend, value).await?);
        }
        Ok(transferred)
    }

    // ── Execution records ────────────────────────────────────────────────

    /// Named results of a completed execution, or `None` for an unknown id.
    pub fn get_context_values(&self, execution_id: Uuid) -> Option<HashMap<String, Uuid>> {
        self.executions.lock().unwrap().get(&execution_id).cloned()
    }

    /// Remove a completed execution's record. Idempotent.
    pub fn drop_execution_result(&self, execution_id: Uuid) {
        self.executions.lock().unwrap().remove(&execution_id);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::create_plan;
    use crate::registry::BackendRegistry;
    use async_trait::async_trait;
    use manifold_types::{
        BackendInfo, NamedValue, PartialResult, Pipeline, PipelinePartDescriptor,
    };
    use manifold_types::NamedPart;
    use std::collections::VecDeque;

    // A scripted backend fleet: each `run_steps` call consumes the next
    // script in order, emitting its partials and either producing outputs
    // under a fresh completion id or failing.

    enum ScriptOutcome {
        Outputs(Vec<NamedValue>),
        Fail(String),
    }

    struct NodeScript {
        partials: Vec<Vec<u8>>,
        outcome: ScriptOutcome,
    }

    #[derive(Default)]
    struct FleetState {
        scripts: VecDeque<NodeScript>,
        received: HashMap<String, Vec<NamedValue>>,
        remote_values: HashMap<Uuid, NamedValue>,
        completions: HashMap<Uuid, Vec<Uuid>>,
        completion_ids: Vec<Uuid>,
        runs: Vec<String>,
    }

    #[derive(Default)]
    struct ScriptedFleet {
        state: Mutex<FleetState>,
    }

    impl ScriptedFleet {
        fn script(&self, partials: Vec<Vec<u8>>, outcome: ScriptOutcome) {
            self.state
                .lock()
                .unwrap()
                .scripts
                .push_back(NodeScript { partials, outcome });
        }
    }

    #[async_trait]
    impl BackendConnector for Arc<ScriptedFleet> {
        async fn backend_info(&self, addr: &str) -> Result<BackendInfo> {
            Ok(BackendInfo {
                name: addr.to_string(),
                pipeline_parts: vec![],
            })
        }

        async fn send_value(&self, addr: &str, value: NamedValue) -> Result<Uuid> {
            let mut state = self.state.lock().unwrap();
            let id = Uuid::now_v7();
            state
                .received
                .entry(addr.to_string())
                .or_default()
                .push(value.clone());
            state.remote_values.insert(id, value);
            Ok(id)
        }

        async fn run_steps(
            &self,
            addr: &str,
            _steps: Vec<PipelinePartDescriptor>,
            _value_ids: Vec<Uuid>,
            events: &mpsc::Sender<ExecutionEvent>,
        ) -> Result<FinalOutcome> {
            let script = {
                let mut state = self.state.lock().unwrap();
                state.runs.push(addr.to_string());
                state.scripts.pop_front().expect("unscripted run_steps call")
            };

            for payload in script.partials {
                events
                    .send(ExecutionEvent::Partial(PartialResult { payload }))
                    .await
                    .map_err(|_| EngineError::Transport("event sink closed".into()))?;
            }

            match script.outcome {
                ScriptOutcome::Fail(message) => Ok(FinalOutcome::Error(message)),
                ScriptOutcome::Outputs(outputs) => {
                    let mut state = self.state.lock().unwrap();
                    let completion_id = Uuid::now_v7();
                    let mut ids = Vec::new();
                    for output in outputs {
                        let id = Uuid::now_v7();
                        state.remote_values.insert(id, output);
                        ids.push(id);
                    }
                    state.completions.insert(completion_id, ids);
                    state.completion_ids.push(completion_id);
                    Ok(FinalOutcome::Success(completion_id))
                }
            }
        }

        async fn list_output_values(&self, _addr: &str, completion_id: Uuid) -> Result<Vec<Uuid>> {
            self.state
                .lock()
                .unwrap()
                .completions
                .get(&completion_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound(format!("completion {completion_id}")))
        }

        async fn fetch_value(&self, _addr: &str, value_id: Uuid) -> Result<NamedValue> {
            self.state
                .lock()
                .unwrap()
                .remote_values
                .get(&value_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound(format!("value {value_id}")))
        }
    }

    fn two_backend_registry() -> BackendRegistry {
        let mut mapping = HashMap::new();
        mapping.insert("Part1".to_string(), vec!["backend-1".to_string()]);
        mapping.insert("Part2".to_string(), vec!["backend-2".to_string()]);
        BackendRegistry::with_pinned_map(mapping)
    }

    fn pipeline(names: &[&str]) -> Pipeline {
        Pipeline::new(
            names
                .iter()
                .map(|n| PipelinePartDescriptor::Named(NamedPart::new(*n)))
                .collect(),
        )
    }

    fn executor(fleet: &Arc<ScriptedFleet>) -> PipelineExecutor {
        PipelineExecutor::new(Arc::new(fleet.clone()), Arc::new(ValueStore::new()))
    }

    async fn run(
        executor: &PipelineExecutor,
        plan: &ExecutionPlan,
        initial: Vec<Uuid>,
    ) -> (Result<Uuid>, Vec<ExecutionEvent>) {
        let (tx, mut rx) = mpsc::channel(64);
        let result = executor.execute(plan, initial, tx).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (result, events)
    }

    #[tokio::test]
    async fn empty_plan_succeeds_with_nil_id_and_no_backend_calls() {
        let fleet = Arc::new(ScriptedFleet::default());
        let exec = executor(&fleet);

        let (result, events) = run(&exec, &ExecutionPlan::default(), vec![]).await;

        assert_eq!(result.unwrap(), Uuid::nil());
        assert_eq!(
            events,
            vec![ExecutionEvent::Final(FinalOutcome::Success(Uuid::nil()))]
        );
        assert!(fleet.state.lock().unwrap().runs.is_empty());
    }

    #[tokio::test]
    async fn single_node_success_mints_orchestrator_id() {
        let fleet = Arc::new(ScriptedFleet::default());
        fleet.script(
            vec![vec![1], vec![2]],
            ScriptOutcome::Outputs(vec![NamedValue::new("names_log", vec![7; 10])]),
        );
        let exec = executor(&fleet);

        let input_id = exec.session_store().put(NamedValue::new("event_log", vec![5; 3000]));
        let registry = two_backend_registry();
        let plan = create_plan(&registry, &pipeline(&["Part1"])).unwrap();

        let (result, events) = run(&exec, &plan, vec![input_id]).await;
        let execution_id = result.unwrap();

        // The backend saw the transferred input.
        let state = fleet.state.lock().unwrap();
        assert_eq!(state.received["backend-1"].len(), 1);
        assert_eq!(state.received["backend-1"][0].key, "event_log");

        // Terminal carries the orchestrator id, never the backend's
        // completion id.
        assert_ne!(execution_id, state.completion_ids[0]);
        assert_eq!(
            events.last(),
            Some(&ExecutionEvent::Final(FinalOutcome::Success(execution_id)))
        );
        assert_eq!(events.len(), 3);
        drop(state);

        // The record maps the output key to a value retrievable from the
        // session store.
        let record = exec.get_context_values(execution_id).unwrap();
        let value_id = record["names_log"];
        assert_eq!(exec.session_store().get(value_id).unwrap().payload, vec![7; 10]);
    }

    #[tokio::test]
    async fn multi_node_chains_outputs_between_backends() {
        let fleet = Arc::new(ScriptedFleet::default());
        fleet.script(
            vec![],
            ScriptOutcome::Outputs(vec![NamedValue::new("intermediate", vec![1, 2, 3])]),
        );
        fleet.script(
            vec![],
            ScriptOutcome::Outputs(vec![NamedValue::new("final", vec![9])]),
        );
        let exec = executor(&fleet);

        let registry = two_backend_registry();
        let plan = create_plan(&registry, &pipeline(&["Part1", "Part2"])).unwrap();

        let (result, _) = run(&exec, &plan, vec![]).await;
        let execution_id = result.unwrap();

        let state = fleet.state.lock().unwrap();
        assert_eq!(state.runs, vec!["backend-1", "backend-2"]);
        // backend-2 received exactly backend-1's output.
        assert_eq!(state.received["backend-2"].len(), 1);
        assert_eq!(state.received["backend-2"][0].key, "intermediate");
        assert_eq!(state.received["backend-2"][0].payload, vec![1, 2, 3]);
        drop(state);

        // Only the final node's outputs reach the session store; the
        // per-hop store holding "intermediate" was discarded.
        assert_eq!(exec.session_store().len(), 1);
        let record = exec.get_context_values(execution_id).unwrap();
        assert_eq!(record.len(), 1);
        assert!(record.contains_key("final"));
    }

    #[tokio::test]
    async fn intermediate_failure_aborts_and_preserves_partials() {
        let fleet = Arc::new(ScriptedFleet::default());
        fleet.script(
            vec![vec![10], vec![20]],
            ScriptOutcome::Fail("step exploded".into()),
        );
        let exec = executor(&fleet);

        let registry = two_backend_registry();
        let plan = create_plan(&registry, &pipeline(&["Part1", "Part2"])).unwrap();

        let (result, events) = run(&exec, &plan, vec![]).await;

        assert!(matches!(result, Err(EngineError::RemoteFailure(msg)) if msg == "step exploded"));

        // Partials already streamed stay visible, in order, and the
        // relayed failure is the one and only terminal.
        assert_eq!(
            events,
            vec![
                ExecutionEvent::Partial(PartialResult { payload: vec![10] }),
                ExecutionEvent::Partial(PartialResult { payload: vec![20] }),
                ExecutionEvent::Final(FinalOutcome::Error("step exploded".into())),
            ]
        );

        // Second node never ran; no record was registered.
        assert_eq!(fleet.state.lock().unwrap().runs, vec!["backend-1"]);
        assert!(exec.executions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_initial_value_id_fails_with_terminal_error() {
        let fleet = Arc::new(ScriptedFleet::default());
        let exec = executor(&fleet);

        let registry = two_backend_registry();
        let plan = create_plan(&registry, &pipeline(&["Part1"])).unwrap();

        let (result, events) = run(&exec, &plan, vec![Uuid::now_v7()]).await;

        assert!(matches!(result, Err(EngineError::NotFound(_))));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ExecutionEvent::Final(FinalOutcome::Error(_))
        ));
    }

    #[tokio::test]
    async fn drop_execution_result_is_idempotent() {
        let fleet = Arc::new(ScriptedFleet::default());
        fleet.script(vec![], ScriptOutcome::Outputs(vec![NamedValue::new("k", vec![])]));
        let exec = executor(&fleet);

        let registry = two_backend_registry();
        let plan = create_plan(&registry, &pipeline(&["Part1"])).unwrap();
        let (result, _) = run(&exec, &plan, vec![]).await;
        let execution_id = result.unwrap();

        assert!(exec.get_context_values(execution_id).is_some());
        exec.drop_execution_result(execution_id);
        assert!(exec.get_context_values(execution_id).is_none());
        exec.drop_execution_result(execution_id);
    }
}
