//! Orchestrator process configuration.

/// Environment variable holding the semicolon-delimited backend address list,
/// consulted when `--backends` is not given.
pub const BACKENDS_ENV_VAR: &str = "MANIFOLD_BACKENDS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no backend addresses: set the {0} environment variable or pass --backends")]
    MissingBackends(&'static str),

    #[error("the backend address list is empty")]
    EmptyBackends,
}

/// Split a semicolon-delimited backend address list, dropping blanks.
pub fn parse_backend_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address the orchestrator's own RPC endpoint listens on.
    pub listen_addr: String,
    /// Candidate backend addresses used to seed dynamic discovery.
    pub backends: Vec<String>,
}

impl NodeConfig {
    /// Resolve configuration from CLI arguments, falling back to
    /// [`BACKENDS_ENV_VAR`] for the backend list. A missing or empty list
    /// is fatal at startup.
    pub fn resolve(
        listen_addr: String,
        backends_arg: Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw = match backends_arg {
            Some(raw) => raw,
            None => std::env::var(BACKENDS_ENV_VAR)
                .map_err(|_| ConfigError::MissingBackends(BACKENDS_ENV_VAR))?,
        };

        let backends = parse_backend_list(&raw);
        if backends.is_empty() {
            return Err(ConfigError::EmptyBackends);
        }

        Ok(Self {
            listen_addr,
            backends,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
