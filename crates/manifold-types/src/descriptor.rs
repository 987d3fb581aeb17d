//! Pipeline part descriptors as carried in an `Execute` request.
//!
//! A closed sum type: the planner matches exhaustively, so adding a fourth
//! shape is a compile-time-checked exercise rather than a runtime surprise.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Named part ───────────────────────────────────────────────────────────────

/// An operation identified by name, resolved to a backend by the planner.
/// `configuration` is an opaque payload forwarded to the backend unread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPart {
    pub name: String,
    pub configuration: Vec<u8>,
}

impl NamedPart {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            configuration: Vec::new(),
        }
    }
}

// ── Descriptor ───────────────────────────────────────────────────────────────

/// One step of a client-submitted pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePartDescriptor {
    /// A named operation requiring backend resolution.
    Named(NamedPart),

    /// A multi-key value retrieval preceded by a named step that must run
    /// immediately before it. Resolved exactly like [`Self::Named`], using
    /// `before.name` for backend lookup.
    ComplexValueRequest {
        keys: Vec<String>,
        frontend_part_id: Uuid,
        frontend_part_name: String,
        before: NamedPart,
    },

    /// A single-key value retrieval with no resolution name of its own.
    /// Always joins the most recently created plan node; never a node's
    /// first step.
    SimpleValueRequest {
        key: String,
        frontend_part_id: Uuid,
        frontend_part_name: String,
    },
}

impl PipelinePartDescriptor {
    /// The name used for backend lookup, if this step has one.
    pub fn resolution_name(&self) -> Option<&str> {
        match self {
            Self::Named(part) => Some(&part.name),
            Self::ComplexValueRequest { before, .. } => Some(&before.name),
            Self::SimpleValueRequest { .. } => None,
        }
    }

    /// The name shown when rendering a plan.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Named(part) => &part.name,
            Self::ComplexValueRequest { before, .. } => &before.name,
            Self::SimpleValueRequest { key, .. } => key,
        }
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

/// An ordered list of steps submitted by a client for end-to-end execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipeline {
    pub parts: Vec<PipelinePartDescriptor>,
}

impl Pipeline {
    pub fn new(parts: Vec<PipelinePartDescriptor>) -> Self {
        Self { parts }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
