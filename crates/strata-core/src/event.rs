// crates/strata-core/src/event.rs
//
// Event records returned by every state-changing call.
//
// Events describe committed effects (a balance row updated, a history row
// inserted). They are returned to the caller for logging and downstream
// indexing and are never used to drive state.

use serde::{Deserialize, Serialize};

/// Kind of change an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Insert,
    Update,
    Delete,
}

/// One effect of an operation on a logical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: EventKind,
    pub table: String,
    pub data: serde_json::Value,
}

impl EventRecord {
    pub fn insert(table: &str, data: serde_json::Value) -> Self {
        Self {
            kind: EventKind::Insert,
            table: table.to_string(),
            data,
        }
    }

    pub fn update(table: &str, data: serde_json::Value) -> Self {
        Self {
            kind: EventKind::Update,
            table: table.to_string(),
            data,
        }
    }

    pub fn delete(table: &str, data: serde_json::Value) -> Self {
        Self {
            kind: EventKind::Delete,
            table: table.to_string(),
            data,
        }
    }
}
