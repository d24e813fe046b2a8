//! Built-in kinematic arena the bridge drives when run as a binary.
//!
//! One agent and one sentry share a rectangular field. The sentry is an
//! aiming trainer that shuffles along its heading on a fixed schedule. Every
//! operation takes one turn of simulation time. Bullets are settled on their
//! own OS thread, so their events reach the accumulator the same way a real
//! engine's callbacks would: from outside the scheduler's task.
mod geometry;
mod world;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use bridge_runtime::protocol::{Bullet, Reading, StateField};
use bridge_runtime::{EventAccumulator, Readings, SimResult, Simulation};
use tracing::{debug, warn};

pub use world::{AGENT_NAME, SENTRY_NAME};
use world::{Shot, World};

#[derive(Clone, Debug, PartialEq)]
pub struct ArenaConfig {
    pub width: f64,
    pub height: f64,
    /// Turns after which the round ends.
    pub max_turns: u64,
    pub rounds: u32,
}

impl ArenaConfig {
    /// Smallest accepted battlefield side.
    pub const MIN_SIDE: f64 = 200.0;
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            max_turns: 1000,
            rounds: 1,
        }
    }
}

pub struct ArenaSimulation {
    world: Arc<Mutex<World>>,
    events: Arc<EventAccumulator>,
    bullets: Mutex<Vec<JoinHandle<()>>>,
}

impl ArenaSimulation {
    pub fn new(config: ArenaConfig, events: Arc<EventAccumulator>) -> Self {
        Self {
            world: Arc::new(Mutex::new(World::new(config))),
            events,
            bullets: Mutex::new(Vec::new()),
        }
    }

    /// Resets the field for the next episode once every bullet has landed.
    pub fn next_round(&self) {
        self.settle();
        let mut world = lock(&self.world);
        world.new_round();
        debug!(target: "bridge::arena", round = world.round(), "new round");
    }

    /// Waits for every bullet still in flight.
    pub fn settle(&self) {
        let in_flight = std::mem::take(&mut *lock(&self.bullets));
        for handle in in_flight {
            if handle.join().is_err() {
                warn!(target: "bridge::arena", "bullet thread panicked");
            }
        }
    }

    /// Runs `op` as one turn of simulation time.
    fn step<T>(&self, op: impl FnOnce(&mut World, &EventAccumulator) -> T) -> SimResult<T> {
        let mut world = lock(&self.world);
        world.begin()?;
        let out = op(&mut world, &self.events);
        world.finish(&self.events);
        Ok(out)
    }

    fn launch(&self, shot: Shot) {
        let world = Arc::clone(&self.world);
        let events = Arc::clone(&self.events);
        let fallback = shot.clone();

        let spawned = thread::Builder::new()
            .name("arena-bullet".to_string())
            .spawn(move || {
                lock(&world).resolve(shot, &events);
            });

        match spawned {
            Ok(handle) => {
                let mut bullets = lock(&self.bullets);
                bullets.retain(|handle| !handle.is_finished());
                bullets.push(handle);
            }
            Err(err) => {
                warn!(target: "bridge::arena", error = %err, "resolving bullet inline");
                lock(&self.world).resolve(fallback, &self.events);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Readings for ArenaSimulation {
    fn read(&self, field: StateField) -> Option<Reading> {
        lock(&self.world).read(field)
    }
}

#[async_trait]
impl Simulation for ArenaSimulation {
    async fn do_nothing(&self) -> SimResult<()> {
        self.step(|_, _| ())
    }

    async fn ahead(&self, distance: f64) -> SimResult<()> {
        self.step(|world, events| world.move_by(distance, events))
    }

    async fn back(&self, distance: f64) -> SimResult<()> {
        self.step(|world, events| world.move_by(-distance, events))
    }

    async fn turn_left(&self, degrees: f64) -> SimResult<()> {
        self.step(|world, events| world.turn_body(-degrees, events))
    }

    async fn turn_right(&self, degrees: f64) -> SimResult<()> {
        self.step(|world, events| world.turn_body(degrees, events))
    }

    async fn turn_radar_left(&self, degrees: f64) -> SimResult<()> {
        self.step(|world, events| world.turn_radar(-degrees, events))
    }

    async fn turn_radar_right(&self, degrees: f64) -> SimResult<()> {
        self.step(|world, events| world.turn_radar(degrees, events))
    }

    async fn turn_gun_left(&self, degrees: f64) -> SimResult<()> {
        self.step(|world, events| world.turn_gun(-degrees, events))
    }

    async fn turn_gun_right(&self, degrees: f64) -> SimResult<()> {
        self.step(|world, events| world.turn_gun(degrees, events))
    }

    async fn set_adjust_radar_for_robot_turn(&self, independent: bool) -> SimResult<()> {
        self.step(|world, _| world.set_adjust_radar_for_robot_turn(independent))
    }

    async fn set_adjust_radar_for_gun_turn(&self, independent: bool) -> SimResult<()> {
        self.step(|world, _| world.set_adjust_radar_for_gun_turn(independent))
    }

    async fn set_adjust_gun_for_robot_turn(&self, independent: bool) -> SimResult<()> {
        self.step(|world, _| world.set_adjust_gun_for_robot_turn(independent))
    }

    async fn scan(&self) -> SimResult<()> {
        self.step(|world, events| world.scan(events))
    }

    async fn fire(&self, power: f64) -> SimResult<Option<Bullet>> {
        let shot = self.step(|world, _| world.fire(power))?;
        Ok(shot.map(|shot| {
            let bullet = shot.bullet.clone();
            self.launch(shot);
            bullet
        }))
    }

    async fn stop(&self, overwrite: bool) -> SimResult<()> {
        self.step(|world, _| world.stop(overwrite))
    }

    async fn resume(&self) -> SimResult<()> {
        self.step(|world, _| world.resume())
    }
}
