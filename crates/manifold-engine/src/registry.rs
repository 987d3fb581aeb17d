//! Backend capability registry.
//!
//! Maps each pipeline part name to the ordered list of backend addresses
//! able to run it (discovery order doubles as the deterministic selection
//! fallback). Two mutually exclusive lifecycles:
//!
//! - **dynamic** — rebuilt wholesale on every [`BackendRegistry::update`]
//!   by querying each candidate backend for its capabilities;
//! - **pinned** — set once via [`BackendRegistry::set_pinned`], after
//!   which discovery is permanently disabled for this process.
//!
//! Mutation is whole-map replacement under one mutex; readers always see
//! a fully-formed mapping. No lock is ever held across an RPC.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::connector::BackendConnector;
use crate::error::{EngineError, Result};

#[derive(Debug, Default)]
struct RegistryState {
    mapping: HashMap<String, Vec<String>>,
    pinned: bool,
}

#[derive(Debug, Default)]
pub struct BackendRegistry {
    state: Mutex<RegistryState>,
}

impl BackendRegistry {
    /// An empty dynamic registry, populated by discovery sweeps.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pinned at construction. Discovery is disabled from the
    /// start; used by tests and by deployments with a fixed fleet.
    pub fn with_pinned_map(mapping: HashMap<String, Vec<String>>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                mapping,
                pinned: true,
            }),
        }
    }

    /// Run a discovery sweep over `addresses` and swap in the rebuilt map.
    ///
    /// One task per candidate address, joined before the swap; an address
    /// whose capability query fails is logged and excluded, never fatal —
    /// partial fleet availability is tolerated. No-op once pinned.
    pub async fn update(
        &self,
        addresses: &[String],
        connector: &Arc<dyn BackendConnector>,
    ) -> Result<()> {
        if self.is_pinned() {
            return Ok(());
        }

        let mut sweep = JoinSet::new();
        for addr in addresses {
            let connector = connector.clone();
            let addr = addr.clone();
            sweep.spawn(async move {
                let info = connector.backend_info(&addr).await;
                (addr, info)
            });
        }

        let mut declared: HashMap<String, Vec<String>> = HashMap::new();
        while let Some(joined) = sweep.join_next().await {
            let Ok((addr, info)) = joined else { continue };
            match info {
                Ok(info) => {
                    declared.insert(addr, info.pipeline_parts);
                }
                Err(e) => {
                    warn!(backend = %addr, error = %e, "capability query failed, excluding backend");
                }
            }
        }

        // Rebuild in declaration order so the per-part address lists are
        // deterministic regardless of which query finished first.
        let mut mapping: HashMap<String, Vec<String>> = HashMap::new();
        for addr in addresses {
            if let Some(parts) = declared.get(addr) {
                for part in parts {
                    mapping.entry(part.clone()).or_default().push(addr.clone());
                }
            }
        }

        info!(
            backends = declared.len(),
            parts = mapping.len(),
            "backend registry updated"
        );

        let mut state = self.state.lock().unwrap();
        // A pin that landed during the sweep wins.
        if !state.pinned {
            state.mapping = mapping;
        }
        Ok(())
    }

    /// Replace the mapping unconditionally and disable discovery.
    /// Irreversible for the life of the process.
    pub fn set_pinned(&self, mapping: HashMap<String, Vec<String>>) {
        let mut state = self.state.lock().unwrap();
        state.mapping = mapping;
        state.pinned = true;
    }

    /// Backends able to run `part_name`, in discovery/declaration order.
    pub fn lookup(&self, part_name: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        match state.mapping.get(part_name) {
            Some(backends) if !backends.is_empty() => Ok(backends.clone()),
            _ => Err(EngineError::NoBackendForPart(part_name.to_string())),
        }
    }

    /// The full mapping, for introspection and reporting.
    pub fn snapshot(&self) -> HashMap<String, Vec<String>> {
        self.state.lock().unwrap().mapping.clone()
    }

    /// Sorted union of all registered part names — the orchestrator's own
    /// aggregate capability declaration.
    pub fn part_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state.mapping.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_pinned(&self) -> bool {
        self.state.lock().unwrap().pinned
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
