//! Partitioning a pipeline into backend-affine runs.
//!
//! Walks the steps in order with a single `last_used_backend` cursor.
//! Consecutive steps that resolve to the same backend merge into one plan
//! node, so the number of inter-backend value transfers is bounded by the
//! number of distinct backend *regions* the pipeline visits, not by the
//! number of steps. Non-adjacent runs on the same backend are never
//! merged — order is execution order.

use std::fmt;

use manifold_types::{Pipeline, PipelinePartDescriptor};

use crate::error::{EngineError, Result};
use crate::registry::BackendRegistry;

// ── Plan ─────────────────────────────────────────────────────────────────────

/// A contiguous run of steps bound to one backend.
#[derive(Debug, Clone)]
pub struct ExecutionPlanNode {
    backend: String,
    steps: Vec<PipelinePartDescriptor>,
}

impl ExecutionPlanNode {
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Non-empty by construction.
    pub fn steps(&self) -> &[PipelinePartDescriptor] {
        &self.steps
    }
}

impl fmt::Display for ExecutionPlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.steps.iter().map(|s| s.display_name()).collect();
        write!(f, "({})[{}]", self.backend, names.join(", "))
    }
}

/// Ordered node list produced once per top-level request, immutable
/// thereafter, consumed by the executor.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    nodes: Vec<ExecutionPlanNode>,
}

impl ExecutionPlan {
    pub fn nodes(&self) -> &[ExecutionPlanNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.nodes.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

// ── Planning ─────────────────────────────────────────────────────────────────

/// Partition `pipeline` into backend-affine nodes against the registry's
/// current mapping. Fatal on the first unresolvable step; no partial plan
/// is ever returned.
pub fn create_plan(registry: &BackendRegistry, pipeline: &Pipeline) -> Result<ExecutionPlan> {
    let mut nodes: Vec<ExecutionPlanNode> = Vec::new();
    let mut last_used_backend: Option<String> = None;

    for step in &pipeline.parts {
        let Some(name) = step.resolution_name() else {
            // A single-key value request joins the most recently created
            // node; it has no name of its own and never opens a node.
            match nodes.last_mut() {
                Some(node) => node.steps.push(step.clone()),
                None => {
                    return Err(EngineError::MalformedPipeline(
                        "a value-only request cannot be the first pipeline step".into(),
                    ))
                }
            }
            continue;
        };

        let candidates = registry.lookup(name)?;
        let selected = select_backend(&candidates, last_used_backend.as_deref());

        match (nodes.last_mut(), last_used_backend.as_deref()) {
            (Some(node), Some(last)) if last == selected => node.steps.push(step.clone()),
            _ => nodes.push(ExecutionPlanNode {
                backend: selected.clone(),
                steps: vec![step.clone()],
            }),
        }

        last_used_backend = Some(selected);
    }

    Ok(ExecutionPlan { nodes })
}

/// Pick a backend from a non-empty candidate list: sticky affinity first
/// (keep using `last_used` when it is among the candidates), else the
/// first candidate in registry order.
fn select_backend(candidates: &[String], last_used: Option<&str>) -> String {
    if candidates.len() > 1 {
        if let Some(last) = last_used {
            if candidates.iter().any(|c| c == last) {
                return last.to_string();
            }
        }
    }
    candidates[0].clone()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
