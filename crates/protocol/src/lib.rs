//! Wire protocol between a simulated agent and a remote policy server.
//!
//! The agent reports a [`StateReport`] (full state snapshot plus every event
//! captured since the previous report) and the server answers with exactly
//! one [`Action`]. This crate holds the message shapes only; it performs no
//! I/O and knows nothing about threads or transports.
//!
//! Modules are organized by message part:
//! - [`state`] defines the versioned list of state readings
//! - [`event`] defines the closed set of simulation events and their wire names
//! - [`action`] defines the action vocabulary and its strict decoding rules
//! - [`report`] bundles state and events into the outgoing message
pub mod action;
pub mod event;
pub mod report;
pub mod state;

pub use action::{
    Action, ActionDecodeError, ActionEnvelope, ActionName, PROTOCOL_VERSION, RawAction, ValueKind,
};
pub use event::{Bullet, Event, EventBuffer, EventKind, EventPayload};
pub use report::StateReport;
pub use state::{Reading, STATE_SCHEMA_VERSION, ScannedEntity, State, StateField};
