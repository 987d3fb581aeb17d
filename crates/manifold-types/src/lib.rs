//! `manifold-types` — Shared data model for the Manifold orchestrator.
//!
//! Everything that crosses a crate or process boundary lives here: pipeline
//! part descriptors, named context values, execution events, backend info,
//! and process configuration. Pure data, no I/O.

pub mod config;
pub mod descriptor;
pub mod events;
pub mod value;

// ── Public re-exports ────────────────────────────────────────────────────────

pub use config::{parse_backend_list, ConfigError, NodeConfig, BACKENDS_ENV_VAR};
pub use descriptor::{NamedPart, Pipeline, PipelinePartDescriptor};
pub use events::{BackendInfo, ExecutionEvent, FinalOutcome, PartialResult};
pub use value::NamedValue;
