use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a highlight, assigned once when it is added to a track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightId(String);

impl HighlightId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for HighlightId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for HighlightId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

pub trait IdGenerator: Send + Sync {
    fn next_id(&mut self) -> HighlightId;
}

#[derive(Debug, Default)]
pub struct UuidIdGen;

impl IdGenerator for UuidIdGen {
    fn next_id(&mut self) -> HighlightId {
        HighlightId(uuid::Uuid::new_v4().to_string())
    }
}

/// Deterministic sequential ID generator for tests and fixtures where reproducible highlight
/// IDs are required.
#[derive(Debug)]
pub struct SequentialIdGen {
    prefix: &'static str,
    next: u64,
}

impl SequentialIdGen {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 0 }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("h")
    }
}

impl IdGenerator for SequentialIdGen {
    fn next_id(&mut self) -> HighlightId {
        let id = self.next;
        self.next += 1;
        HighlightId(format!("{}{id}", self.prefix))
    }
}
