//! `manifold-engine` — The orchestration core.
//!
//! This crate is a **coordination layer**, not a compute layer. Pipeline
//! parts execute inside independent backend processes; the engine decides
//! which backend runs which contiguous run of steps, moves intermediate
//! values between backends (which share no memory or storage), streams
//! partial results to the caller, and owns the client-visible execution
//! identity.
//!
//! # Architecture
//!
//! ```text
//! client request ──▶ planner ──▶ execution plan ──▶ executor
//!                       │                              │
//!                  backend registry              value stores +
//!                  (part → backends)           chunked transfers
//! ```

pub mod connector;
pub mod error;
pub mod executor;
pub mod planner;
pub mod registry;
pub mod store;

// ── Public re-exports ────────────────────────────────────────────────────────

pub use connector::{BackendConnector, RpcConnector};
pub use error::{EngineError, Result};
pub use executor::PipelineExecutor;
pub use planner::{create_plan, ExecutionPlan, ExecutionPlanNode};
pub use registry::BackendRegistry;
pub use store::ValueStore;
