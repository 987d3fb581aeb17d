use manifold_net::NetError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("there are no backends for pipeline part {0}")]
    NoBackendForPart(String),

    #[error("malformed pipeline: {0}")]
    MalformedPipeline(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend transport error: {0}")]
    Transport(String),

    #[error("remote execution failed: {0}")]
    RemoteFailure(String),
}

impl From<NetError> for EngineError {
    fn from(e: NetError) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, EngineError>;
