//! Outgoing state report: `{"state": {...}, "events": {...}}`.
use serde::{Deserialize, Serialize};

use crate::event::{EventBuffer, EventKind};
use crate::state::State;

/// One flush worth of data sent to the policy server.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateReport {
    pub state: State,
    pub events: EventBuffer,
}

impl StateReport {
    pub fn new(state: State, events: EventBuffer) -> Self {
        Self { state, events }
    }

    /// Terminal event kind carried by this report, if any.
    pub fn terminal_kind(&self) -> Option<EventKind> {
        self.events.terminal_kind()
    }

    /// Serializes the report as a single JSON line (no trailing newline).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
