//! `manifold-net` — Wire protocol and RPC plumbing.
//!
//! Every RPC is one TCP connection carrying `[u32 BE length][bincode]`
//! frames: a single [`Request`] frame from the caller, then reply frames
//! whose shape depends on the operation. Streams are just sequences of
//! frames on the same connection — an `Execute` call yields
//! [`Reply::Event`] frames ending in a terminal event, and value transfer
//! moves [`ValueChunk`]s until an end marker.
//!
//! Bincode is used because context values carry raw `Vec<u8>` payloads;
//! bincode writes these as length + raw bytes with no re-encoding overhead.

pub mod chunk;
pub mod client;
pub mod error;
pub mod frame;
pub mod messages;
pub mod server;

// ── Public re-exports ────────────────────────────────────────────────────────

pub use chunk::{split_value, ValueAssembler};
pub use client::{AdminClient, BackendClient, Connection, ValueClient};
pub use error::{NetError, Result};
pub use frame::{read_frame, write_frame, MAX_FRAME_BYTES};
pub use messages::{ChunkFrame, Reply, Request, ValueChunk, VALUE_CHUNK_BYTES};
pub use server::{bind, serve, RpcHandler};
