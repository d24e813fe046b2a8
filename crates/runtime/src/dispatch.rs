//! Maps a decoded [`Action`] onto one simulation operation.
//!
//! Value shapes were already checked when the action was decoded, so dispatch
//! cannot fail on input; it only forwards errors raised by the simulation.
use bridge_protocol::{Action, Bullet};
use tracing::debug;

use crate::api::{SimResult, Simulation};

/// What a dispatched action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// The operation ran to completion.
    Completed,
    /// `fire` ran; carries the bullet when one actually left the gun.
    Fired(Option<Bullet>),
    /// Unrecognized action name; no simulation call was made.
    Ignored,
}

/// Performs `action` on `sim`.
pub async fn dispatch<S: Simulation + ?Sized>(action: &Action, sim: &S) -> SimResult<Dispatched> {
    match action {
        Action::DoNothing => sim.do_nothing().await?,
        Action::Ahead(distance) => sim.ahead(*distance).await?,
        Action::Back(distance) => sim.back(*distance).await?,
        Action::TurnLeft(degrees) => sim.turn_left(*degrees).await?,
        Action::TurnRight(degrees) => sim.turn_right(*degrees).await?,
        Action::TurnRadarLeft(degrees) => sim.turn_radar_left(*degrees).await?,
        Action::TurnRadarRight(degrees) => sim.turn_radar_right(*degrees).await?,
        Action::SetAdjustRadarForRobotTurn(flag) => {
            sim.set_adjust_radar_for_robot_turn(*flag).await?
        }
        Action::SetAdjustRadarForGunTurn(flag) => sim.set_adjust_radar_for_gun_turn(*flag).await?,
        Action::Scan => sim.scan().await?,
        Action::TurnGunLeft(degrees) => sim.turn_gun_left(*degrees).await?,
        Action::TurnGunRight(degrees) => sim.turn_gun_right(*degrees).await?,
        Action::SetAdjustGunForRobotTurn(flag) => sim.set_adjust_gun_for_robot_turn(*flag).await?,
        Action::Fire(power) => return Ok(Dispatched::Fired(sim.fire(*power).await?)),
        Action::Stop(overwrite) => sim.stop(*overwrite).await?,
        Action::Resume => sim.resume().await?,
        Action::Unrecognized(name) => {
            debug!(target: "bridge::dispatch", name = %name, "ignoring unrecognized action");
            return Ok(Dispatched::Ignored);
        }
    }

    Ok(Dispatched::Completed)
}
