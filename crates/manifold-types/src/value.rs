use serde::{Deserialize, Serialize};

/// An opaque piece of data flowing between pipeline steps, addressed by a
/// string key and, while resident in a store, by a locally minted id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedValue {
    pub key: String,
    pub payload: Vec<u8>,
}

impl NamedValue {
    pub fn new(key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }
}
