//! Full state snapshot taken before every report.
use bridge_protocol::{State, StateField};
use strum::IntoEnumIterator;

use crate::api::Readings;

/// Reads every [`StateField`] from the simulation.
///
/// Unavailable readings are kept as explicit nulls so the receiver always
/// sees the same key set.
pub fn snapshot<R: Readings + ?Sized>(sim: &R) -> State {
    let mut state = State::new();
    for field in StateField::iter() {
        state.insert(field, sim.read(field));
    }
    state
}
