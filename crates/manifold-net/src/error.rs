#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("remote error: {0}")]
    Remote(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, NetError>;
