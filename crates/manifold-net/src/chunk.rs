//! Splitting and reassembly for the chunked value transfer protocol.

use manifold_types::NamedValue;

use crate::messages::{ValueChunk, VALUE_CHUNK_BYTES};

/// Split a value's payload into [`VALUE_CHUNK_BYTES`]-sized chunks, each
/// carrying the key. An empty payload still yields one empty chunk so the
/// key travels.
pub fn split_value(value: &NamedValue) -> Vec<ValueChunk> {
    if value.payload.is_empty() {
        return vec![ValueChunk {
            key: value.key.clone(),
            bytes: Vec::new(),
        }];
    }

    value
        .payload
        .chunks(VALUE_CHUNK_BYTES)
        .map(|bytes| ValueChunk {
            key: value.key.clone(),
            bytes: bytes.to_vec(),
        })
        .collect()
}

/// Reassembles a value from chunks arriving in order.
///
/// The key is taken from the last chunk seen, tolerating both the
/// key-on-every-chunk and key-on-last-chunk sending conventions.
#[derive(Debug, Default)]
pub struct ValueAssembler {
    key: String,
    buffer: Vec<u8>,
}

impl ValueAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: ValueChunk) {
        self.key = chunk.key;
        self.buffer.extend_from_slice(&chunk.bytes);
    }

    pub fn finish(self) -> NamedValue {
        NamedValue {
            key: self.key,
            payload: self.buffer,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
