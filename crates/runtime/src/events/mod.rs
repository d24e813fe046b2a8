//! Event capture between two state reports.
//!
//! Simulation callbacks push into the [`EventAccumulator`] from the engine
//! thread; the scheduler drains it once per report.

mod accumulator;

pub use accumulator::EventAccumulator;
