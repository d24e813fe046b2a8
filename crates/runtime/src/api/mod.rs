//! Public runtime API surface.
//!
//! Gathers the seams a host plugs into: the [`Simulation`] the agent lives in
//! and the error types every layer reports through.

pub mod errors;
pub mod simulation;

pub use errors::{BridgeError, Result, TransportError};
pub use simulation::{Readings, SimResult, Simulation, SimulationError};
