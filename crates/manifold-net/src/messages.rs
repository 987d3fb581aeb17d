//! The RPC message set.
//!
//! One closed [`Request`] enum covers the whole surface exposed by the
//! orchestrator and implemented symmetrically by every backend. Replies
//! are [`Reply`] frames; client-to-server value streaming uses
//! [`ChunkFrame`]s after a `SetValue` request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use manifold_types::{BackendInfo, ExecutionEvent, Pipeline};

/// Payload bytes per value transfer chunk. The underlying transport has a
/// practical per-message size ceiling, so values of any size are moved as
/// an ordered chunk sequence; the last chunk may be shorter.
pub const VALUE_CHUNK_BYTES: usize = 1024;

// ── Requests ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Run a pipeline. The server answers with a stream of
    /// [`Reply::Event`] frames ending in exactly one terminal event.
    ExecutePipeline {
        pipeline: Pipeline,
        initial_value_ids: Vec<Uuid>,
    },

    /// Capability query: node name plus supported pipeline part names.
    GetBackendInfo,

    /// Look up one named result of a completed execution.
    GetExecutionValue { execution_id: Uuid, key: String },

    /// Look up all result value ids of a completed execution.
    GetAllExecutionValues { execution_id: Uuid },

    /// Remove a completed execution's record. Idempotent.
    DropExecutionResult { execution_id: Uuid },

    /// Push a context value into the receiver's store. Followed by
    /// [`ChunkFrame`]s on the same connection; the server replies with the
    /// freshly minted value id.
    SetValue,

    /// Stream a stored context value back as [`Reply::Chunk`] frames
    /// terminated by [`Reply::ChunkEnd`].
    GetValue { value_id: Uuid },

    /// Remove stored context values. Unknown ids are ignored.
    DropValues { value_ids: Vec<Uuid> },

    /// Administrative: pin the backend registry to a fixed part-to-backends
    /// map, permanently disabling discovery.
    SetBackendMap {
        mapping: HashMap<String, Vec<String>>,
    },
}

// ── Replies ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Reply {
    Ok,
    ValueId(Uuid),
    ValueIds(Vec<Uuid>),
    Info(BackendInfo),
    Event(ExecutionEvent),
    Chunk(ValueChunk),
    ChunkEnd,
    Error(String),
}

// ── Value chunks ─────────────────────────────────────────────────────────────

/// One chunk of a context value in transit. The key is repeated on every
/// chunk; a receiver only needs the last occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChunk {
    pub key: String,
    pub bytes: Vec<u8>,
}

/// Client-to-server frames following a [`Request::SetValue`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChunkFrame {
    Chunk(ValueChunk),
    End,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use manifold_types::{NamedPart, PipelinePartDescriptor};

    fn encode<M: Serialize>(msg: &M) -> Vec<u8> {
        bincode::serde::encode_to_vec(msg, bincode::config::standard()).unwrap()
    }

    fn decode<M: serde::de::DeserializeOwned>(buf: &[u8]) -> M {
        let (msg, _) =
            bincode::serde::decode_from_slice(buf, bincode::config::standard()).unwrap();
        msg
    }

    #[test]
    fn execute_request_round_trip() {
        let req = Request::ExecutePipeline {
            pipeline: Pipeline::new(vec![PipelinePartDescriptor::Named(NamedPart::new(
                "Part1",
            ))]),
            initial_value_ids: vec![Uuid::now_v7()],
        };
        let round: Request = decode(&encode(&req));
        match round {
            Request::ExecutePipeline {
                pipeline,
                initial_value_ids,
            } => {
                assert_eq!(pipeline.parts.len(), 1);
                assert_eq!(initial_value_ids.len(), 1);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn backend_map_round_trip() {
        let mut mapping = HashMap::new();
        mapping.insert(
            "Part1".to_string(),
            vec!["backend-1".to_string(), "backend-2".to_string()],
        );
        let req = Request::SetBackendMap { mapping };
        let round: Request = decode(&encode(&req));
        match round {
            Request::SetBackendMap { mapping } => {
                assert_eq!(mapping["Part1"], vec!["backend-1", "backend-2"]);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn chunk_frame_round_trip() {
        let frame = ChunkFrame::Chunk(ValueChunk {
            key: "names_log".into(),
            bytes: vec![0xAB; VALUE_CHUNK_BYTES],
        });
        let round: ChunkFrame = decode(&encode(&frame));
        match round {
            ChunkFrame::Chunk(chunk) => {
                assert_eq!(chunk.key, "names_log");
                assert_eq!(chunk.bytes.len(), VALUE_CHUNK_BYTES);
            }
            ChunkFrame::End => panic!("wrong variant"),
        }
    }
}
