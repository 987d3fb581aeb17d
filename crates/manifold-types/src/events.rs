//! Execution progress events and backend capability info.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Execution events ─────────────────────────────────────────────────────────

/// A step-progress payload produced by a backend mid-execution.
/// Opaque to the orchestrator; relayed to the client as it arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialResult {
    pub payload: Vec<u8>,
}

/// The single terminal event of an execution stream.
///
/// On the client-facing stream the success id is always minted by the
/// orchestrator — backend-local completion ids never leave the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalOutcome {
    Success(Uuid),
    Error(String),
}

/// One event on an execution result stream: zero or more partials followed
/// by exactly one terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionEvent {
    Partial(PartialResult),
    Final(FinalOutcome),
}

impl ExecutionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}

// ── Backend info ─────────────────────────────────────────────────────────────

/// Capability declaration returned by `GetBackendInfo`. Implemented
/// identically by every backend and by the orchestrator itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    pub name: String,
    pub pipeline_parts: Vec<String>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
