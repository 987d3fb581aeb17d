//! Keyed store for intermediate context values.
//!
//! Two usage patterns share this type: one long-lived session store per
//! orchestrator (holds client-submitted inputs and final-node outputs),
//! and one short-lived store per intermediate hop, discarded once its
//! values have been relayed onward. Ids are UUIDv7 — locally minted,
//! time-ordered, never reused across stores.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use manifold_types::NamedValue;

#[derive(Debug, Default)]
pub struct ValueStore {
    values: Mutex<HashMap<Uuid, NamedValue>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a freshly minted id.
    pub fn put(&self, value: NamedValue) -> Uuid {
        let id = Uuid::now_v7();
        self.values.lock().unwrap().insert(id, value);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<NamedValue> {
        self.values.lock().unwrap().get(&id).cloned()
    }

    /// Remove a value. Unknown ids are ignored.
    pub fn remove(&self, id: Uuid) {
        self.values.lock().unwrap().remove(&id);
    }

    /// Drop all entries. Used when discarding a short-lived per-hop store.
    pub fn clear(&self) {
        self.values.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_round_trip() {
        let store = ValueStore::new();
        let id = store.put(NamedValue::new("event_log", vec![1, 2, 3]));

        let value = store.get(id).unwrap();
        assert_eq!(value.key, "event_log");
        assert_eq!(value.payload, vec![1, 2, 3]);
    }

    #[test]
    fn ids_are_unique_per_put() {
        let store = ValueStore::new();
        let a = store.put(NamedValue::new("k", vec![]));
        let b = store.put(NamedValue::new("k", vec![]));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn get_unknown_id_is_none() {
        let store = ValueStore::new();
        assert!(store.get(Uuid::now_v7()).is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let store = ValueStore::new();
        let id = store.put(NamedValue::new("k", vec![1]));
        store.remove(id);
        store.remove(id);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let store = ValueStore::new();
        store.put(NamedValue::new("a", vec![1]));
        store.put(NamedValue::new("b", vec![2]));
        store.clear();
        assert!(store.is_empty());
    }
}
