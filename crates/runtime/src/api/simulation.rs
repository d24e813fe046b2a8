//! Interface the bridge needs from the live simulation.
//!
//! The engine owns the agent and fires events on its own thread. The bridge
//! only reads state through [`Readings`] and issues the operations of
//! [`Simulation`]; event callbacks reach the bridge through an
//! [`EventAccumulator`](crate::events::EventAccumulator) the host hands to
//! the engine.
use async_trait::async_trait;
use bridge_protocol::{Bullet, Reading, StateField};
use thiserror::Error;

pub type SimResult<T> = std::result::Result<T, SimulationError>;

/// Failure raised by the simulation while performing an operation.
///
/// These never reach the policy server directly; the scheduler suppresses
/// them and the resulting events show up in the next report.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("agent was destroyed")]
    Destroyed,

    #[error("operation rejected by the simulation: {0}")]
    Rejected(String),

    #[error("dispatch task aborted")]
    Aborted(#[source] tokio::task::JoinError),
}

/// Getter-style access to the agent's current readings.
pub trait Readings {
    /// Current value of `field`, or `None` when the reading is unavailable.
    fn read(&self, field: StateField) -> Option<Reading>;

    /// Simulation turn counter, `0` when unavailable.
    fn time(&self) -> u64 {
        self.read(StateField::Time)
            .and_then(|reading| reading.as_f64())
            .map_or(0, |time| time as u64)
    }
}

/// Operations the agent can perform inside the simulation.
///
/// Each call returns once the operation has completed in simulation time.
/// Implementations can be:
/// - A bridge into a real engine's agent handle
/// - A lightweight kinematic stand-in for local runs
/// - Scripted fixtures for testing
#[async_trait]
pub trait Simulation: Readings + Send + Sync + 'static {
    async fn do_nothing(&self) -> SimResult<()>;

    async fn ahead(&self, distance: f64) -> SimResult<()>;

    async fn back(&self, distance: f64) -> SimResult<()>;

    async fn turn_left(&self, degrees: f64) -> SimResult<()>;

    async fn turn_right(&self, degrees: f64) -> SimResult<()>;

    async fn turn_radar_left(&self, degrees: f64) -> SimResult<()>;

    async fn turn_radar_right(&self, degrees: f64) -> SimResult<()>;

    async fn turn_gun_left(&self, degrees: f64) -> SimResult<()>;

    async fn turn_gun_right(&self, degrees: f64) -> SimResult<()>;

    /// Lets the radar keep its heading while the body turns.
    async fn set_adjust_radar_for_robot_turn(&self, independent: bool) -> SimResult<()>;

    /// Lets the radar keep its heading while the gun turns.
    async fn set_adjust_radar_for_gun_turn(&self, independent: bool) -> SimResult<()>;

    /// Lets the gun keep its heading while the body turns.
    async fn set_adjust_gun_for_robot_turn(&self, independent: bool) -> SimResult<()>;

    async fn scan(&self) -> SimResult<()>;

    /// Fires a bullet; `None` when the gun was too hot or energy too low.
    async fn fire(&self, power: f64) -> SimResult<Option<Bullet>>;

    async fn stop(&self, overwrite: bool) -> SimResult<()>;

    async fn resume(&self) -> SimResult<()>;
}
