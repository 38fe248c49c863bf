//! Small payloads shared across services.

use serde::{Deserialize, Serialize};

/// Bulk-identifier payload: `{"ids": [1, 2, 3]}`.
///
/// Carried as-is; what the ids refer to is up to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ids {
    pub ids: Vec<i64>,
}

impl Ids {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl From<Vec<i64>> for Ids {
    fn from(ids: Vec<i64>) -> Self {
        Self { ids }
    }
}

/// Acknowledgement for commands with nothing else to return.
///
/// Rendered as `{"response": {"success": true}}` so a successful envelope
/// never carries a null payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Default for Ack {
    fn default() -> Self {
        Self { success: true }
    }
}
