//! Turn-by-turn synchronization bridge between a live simulation and a
//! remote policy server.
//!
//! Each turn the agent reports its state plus every event the simulation
//! fired since the last report, blocks for one action from the server, and
//! performs it. Simulation callbacks arrive on the engine's own thread, so
//! the bridge is built around an event buffer with an atomic drain and a
//! scheduler whose every exit path ends in one last flush.
//!
//! Modules are organized by responsibility:
//! - [`api`] exposes the simulation trait and error types
//! - [`events`] holds the thread-safe accumulator fed by simulation callbacks
//! - [`snapshot`] reads the full state from the simulation
//! - [`dispatch`] maps a decoded action onto one simulation operation
//! - [`transport`] provides the stream and HTTP realizations of the wire
//! - [`scheduler`] hosts the episode state machine
pub mod api;
pub mod dispatch;
pub mod events;
pub mod scheduler;
pub mod snapshot;
pub mod transport;

pub use api::{BridgeError, Readings, Result, SimResult, Simulation, SimulationError, TransportError};
pub use dispatch::{Dispatched, dispatch};
pub use events::EventAccumulator;
pub use scheduler::{EpisodeState, EpisodeSummary, ExitReason, TurnScheduler};
pub use snapshot::snapshot;
pub use transport::{Endpoint, HttpTransport, StreamTransport, TcpStreamTransport, Transport};

pub use bridge_protocol as protocol;
