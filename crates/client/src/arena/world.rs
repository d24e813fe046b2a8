//! Arena state and kinematics. Everything here runs under the arena lock.
use bridge_runtime::protocol::{Bullet, Event, EventPayload, Reading, ScannedEntity, StateField};
use bridge_runtime::{EventAccumulator, SimResult, SimulationError};

use super::ArenaConfig;
use super::geometry::{self, Point};

pub const AGENT_NAME: &str = "rlai";
pub const SENTRY_NAME: &str = "sentry";

const BODY_SIZE: f64 = 36.0;
const HALF_BODY: f64 = BODY_SIZE / 2.0;
const START_ENERGY: f64 = 100.0;
const MAX_VELOCITY: f64 = 8.0;
const WALL_DAMAGE: f64 = 3.0;
const RAM_DAMAGE: f64 = 0.6;
const GUN_COOLING_RATE: f64 = 0.1;
const RADAR_RANGE: f64 = 1200.0;
const RADAR_BEAM: f64 = 2.0;
const MIN_POWER: f64 = 0.1;
const MAX_POWER: f64 = 3.0;
const SENTRY_BORDER_SIZE: i64 = 100;
const TRAINER_STEP: f64 = 5.0;
const TRAINER_IDLE_TURNS: u32 = 500;

#[derive(Debug)]
struct Agent {
    position: Point,
    heading: f64,
    gun_heading: f64,
    radar_heading: f64,
    velocity: f64,
    energy: f64,
    gun_heat: f64,
    destroyed: bool,
    /// Velocity saved by `stop`, restored by `resume`.
    stopped: Option<f64>,
}

/// Which parts stay put when the part carrying them turns.
#[derive(Debug, Clone, Copy)]
struct Adjustments {
    gun_for_robot_turn: bool,
    radar_for_robot_turn: bool,
    radar_for_gun_turn: bool,
}

impl Default for Adjustments {
    /// The agent starts with its radar decoupled from the gun.
    fn default() -> Self {
        Self {
            gun_for_robot_turn: false,
            radar_for_robot_turn: false,
            radar_for_gun_turn: true,
        }
    }
}

/// Aiming trainer: steps `TRAINER_STEP` along its heading, then idles for
/// `TRAINER_IDLE_TURNS - round` turns. Hitting a wall, or ramming the agent,
/// reverses the direction of the next step.
#[derive(Debug)]
struct Sentry {
    position: Point,
    heading: f64,
    velocity: f64,
    energy: f64,
    forward: bool,
    /// Turns left before the next step.
    idle: u32,
}

impl Sentry {
    fn alive(&self) -> bool {
        self.energy > 0.0
    }

    fn reverse(&mut self) {
        self.forward = !self.forward;
    }
}

/// Bullet in flight.
#[derive(Clone, Debug)]
pub struct Shot {
    pub bullet: Bullet,
    origin: Point,
    heading: f64,
    round: u32,
}

#[derive(Debug)]
pub struct World {
    config: ArenaConfig,
    time: u64,
    total_turns: u64,
    round: u32,
    round_over: bool,
    agent: Agent,
    adjust: Adjustments,
    sentry: Sentry,
    last_scanned: Option<ScannedEntity>,
}

impl World {
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            agent: spawn_agent(&config),
            sentry: spawn_sentry(&config),
            config,
            time: 0,
            total_turns: 0,
            round: 0,
            round_over: false,
            adjust: Adjustments::default(),
            last_scanned: None,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Starts the next round with both bodies back at their spawn points.
    pub fn new_round(&mut self) {
        self.round += 1;
        self.time = 0;
        self.round_over = false;
        self.agent = spawn_agent(&self.config);
        self.sentry = spawn_sentry(&self.config);
        self.adjust = Adjustments::default();
        self.last_scanned = None;
    }

    /// Opens one turn of simulation time.
    pub fn begin(&mut self) -> SimResult<()> {
        if self.agent.destroyed {
            return Err(SimulationError::Destroyed);
        }
        self.time += 1;
        self.total_turns += 1;
        self.agent.gun_heat = (self.agent.gun_heat - GUN_COOLING_RATE).max(0.0);
        Ok(())
    }

    /// Closes the turn opened by [`begin`](Self::begin).
    pub fn finish(&mut self, events: &EventAccumulator) {
        if !self.round_over {
            self.advance_sentry(events);
        }

        if !self.agent.destroyed && self.agent.energy <= 0.0 {
            self.agent.destroyed = true;
            self.agent.energy = 0.0;
            self.agent.velocity = 0.0;
            self.record(events, EventPayload::Death);
        }

        if !self.round_over && self.time >= self.config.max_turns {
            self.round_over = true;
            self.record(
                events,
                EventPayload::RoundEnded {
                    round: self.round,
                    turns: self.time,
                    total_turns: self.total_turns,
                },
            );
            if self.round + 1 >= self.config.rounds {
                self.record(events, EventPayload::BattleEnded { aborted: false });
            }
        }
    }

    pub fn move_by(&mut self, distance: f64, events: &EventAccumulator) {
        let from = self.agent.position;
        let (target, wall) = self.clamp(from.project(self.agent.heading, distance));

        let contact = if self.sentry.alive() {
            geometry::first_contact(from, target, self.sentry.position, BODY_SIZE)
        } else {
            None
        };

        if let Some(t) = contact {
            self.agent.position = from.lerp(target, t);
            self.agent.velocity = 0.0;
            self.ram(true, events);
            return;
        }

        self.agent.position = target;
        match wall {
            Some(wall_heading) => {
                self.agent.velocity = 0.0;
                self.agent.energy -= WALL_DAMAGE;
                let bearing = geometry::normalize_relative(wall_heading - self.agent.heading);
                self.record(events, EventPayload::HitWall { bearing });
            }
            None => {
                self.agent.velocity = distance.signum() * distance.abs().min(MAX_VELOCITY);
            }
        }
    }

    pub fn turn_body(&mut self, delta: f64, events: &EventAccumulator) {
        self.agent.heading = geometry::normalize_absolute(self.agent.heading + delta);
        if !self.adjust.gun_for_robot_turn {
            self.agent.gun_heading = geometry::normalize_absolute(self.agent.gun_heading + delta);
        }
        if !self.adjust.radar_for_robot_turn && delta != 0.0 {
            self.sweep(delta, events);
        }
    }

    pub fn turn_gun(&mut self, delta: f64, events: &EventAccumulator) {
        self.agent.gun_heading = geometry::normalize_absolute(self.agent.gun_heading + delta);
        if !self.adjust.radar_for_gun_turn && delta != 0.0 {
            self.sweep(delta, events);
        }
    }

    pub fn turn_radar(&mut self, delta: f64, events: &EventAccumulator) {
        self.sweep(delta, events);
    }

    /// Scans along the current radar heading without turning.
    pub fn scan(&mut self, events: &EventAccumulator) {
        self.sweep(0.0, events);
    }

    pub fn set_adjust_gun_for_robot_turn(&mut self, independent: bool) {
        self.adjust.gun_for_robot_turn = independent;
    }

    pub fn set_adjust_radar_for_robot_turn(&mut self, independent: bool) {
        self.adjust.radar_for_robot_turn = independent;
    }

    pub fn set_adjust_radar_for_gun_turn(&mut self, independent: bool) {
        self.adjust.radar_for_gun_turn = independent;
    }

    pub fn stop(&mut self, overwrite: bool) {
        if self.agent.stopped.is_none() || overwrite {
            self.agent.stopped = Some(self.agent.velocity);
        }
        self.agent.velocity = 0.0;
    }

    pub fn resume(&mut self) {
        if let Some(velocity) = self.agent.stopped.take() {
            self.agent.velocity = velocity;
        }
    }

    /// Fires along the gun heading. `None` while the gun is hot or the
    /// agent cannot pay for the shot.
    pub fn fire(&mut self, power: f64) -> Option<Shot> {
        if !power.is_finite() {
            return None;
        }
        let power = power.clamp(MIN_POWER, MAX_POWER);
        if self.agent.gun_heat > 0.0 || self.agent.energy < power {
            return None;
        }

        self.agent.energy -= power;
        self.agent.gun_heat = 1.0 + power / 5.0;

        let origin = self.agent.position;
        let heading = self.agent.gun_heading;
        Some(Shot {
            bullet: Bullet {
                owner: AGENT_NAME.to_string(),
                victim: None,
                x: origin.x,
                y: origin.y,
                heading,
                power,
                active: true,
            },
            origin,
            heading,
            round: self.round,
        })
    }

    /// Settles a bullet: it either strikes the sentry or leaves the field.
    pub fn resolve(&mut self, shot: Shot, events: &EventAccumulator) {
        if shot.round != self.round {
            return;
        }

        let reach = geometry::distance_to_edge(
            shot.origin,
            shot.heading,
            self.config.width,
            self.config.height,
        );
        let end = shot.origin.project(shot.heading, reach);
        let contact = if self.sentry.alive() {
            geometry::first_contact(shot.origin, end, self.sentry.position, HALF_BODY)
        } else {
            None
        };

        let mut bullet = shot.bullet;
        bullet.active = false;

        let Some(t) = contact else {
            bullet.x = end.x;
            bullet.y = end.y;
            self.record(events, EventPayload::BulletMissed { bullet });
            return;
        };

        let impact = shot.origin.lerp(end, t);
        bullet.x = impact.x;
        bullet.y = impact.y;
        bullet.victim = Some(SENTRY_NAME.to_string());

        let power = bullet.power;
        let damage = 4.0 * power + if power > 1.0 { 2.0 * (power - 1.0) } else { 0.0 };
        self.sentry.energy -= damage;
        if !self.agent.destroyed {
            self.agent.energy += 3.0 * power;
        }

        self.record(
            events,
            EventPayload::BulletHit {
                name: SENTRY_NAME.to_string(),
                energy: self.sentry.energy.max(0.0),
                damage,
                bullet,
            },
        );
        if !self.sentry.alive() {
            self.kill_sentry(events);
        }
    }

    pub fn read(&self, field: StateField) -> Option<Reading> {
        let agent = &self.agent;
        let live = |value: f64| (!agent.destroyed).then_some(Reading::from(value));

        match field {
            StateField::BattleFieldHeight => Some(Reading::from(self.config.height)),
            StateField::BattleFieldWidth => Some(Reading::from(self.config.width)),
            StateField::Energy => Some(Reading::from(agent.energy)),
            StateField::GunCoolingRate => Some(Reading::from(GUN_COOLING_RATE)),
            StateField::GunHeading => live(agent.gun_heading),
            StateField::GunHeat => live(agent.gun_heat),
            StateField::Heading => live(agent.heading),
            StateField::Height | StateField::Width => Some(Reading::from(BODY_SIZE)),
            StateField::NumRounds => Some(Reading::from(i64::from(self.config.rounds))),
            StateField::NumSentries => Some(Reading::from(1_i64)),
            StateField::Others => Some(Reading::from(i64::from(self.sentry.alive()))),
            StateField::RadarHeading => live(agent.radar_heading),
            StateField::RoundNum => Some(Reading::from(i64::from(self.round))),
            StateField::SentryBorderSize => Some(Reading::from(SENTRY_BORDER_SIZE)),
            StateField::Time => Some(Reading::from(self.time as i64)),
            StateField::Velocity => live(agent.velocity),
            StateField::X => live(agent.position.x),
            StateField::Y => live(agent.position.y),
            StateField::LastScanned => self.last_scanned.clone().map(Reading::from),
        }
    }

    fn record(&self, events: &EventAccumulator, payload: EventPayload) {
        events.record(Event::new(self.time, payload));
    }

    /// Keeps `point` inside the walls and names the wall that stopped it.
    fn clamp(&self, point: Point) -> (Point, Option<f64>) {
        let (max_x, max_y) = (
            self.config.width - HALF_BODY,
            self.config.height - HALF_BODY,
        );
        let wall = if point.x < HALF_BODY {
            Some(270.0)
        } else if point.x > max_x {
            Some(90.0)
        } else if point.y < HALF_BODY {
            Some(180.0)
        } else if point.y > max_y {
            Some(0.0)
        } else {
            None
        };

        let clamped = Point::new(
            point.x.clamp(HALF_BODY, max_x),
            point.y.clamp(HALF_BODY, max_y),
        );
        (clamped, wall)
    }

    fn sweep(&mut self, delta: f64, events: &EventAccumulator) {
        let start = self.agent.radar_heading;
        self.agent.radar_heading = geometry::normalize_absolute(start + delta);
        if !self.sentry.alive() {
            return;
        }

        let position = self.agent.position;
        let distance = position.distance(self.sentry.position);
        let bearing = geometry::absolute_bearing(position, self.sentry.position);
        if distance > RADAR_RANGE || !geometry::within_sweep(start, delta, bearing, RADAR_BEAM) {
            return;
        }

        let entity = ScannedEntity {
            name: SENTRY_NAME.to_string(),
            bearing: geometry::normalize_relative(bearing - self.agent.heading),
            distance,
            heading: self.sentry.heading,
            velocity: self.sentry.velocity,
            energy: self.sentry.energy,
            time: self.time,
        };
        self.record(
            events,
            EventPayload::ScannedRobot {
                name: entity.name.clone(),
                bearing: entity.bearing,
                distance: entity.distance,
                heading: entity.heading,
                velocity: entity.velocity,
                energy: entity.energy,
            },
        );
        self.last_scanned = Some(entity);
    }

    /// One turn of the trainer's schedule.
    fn advance_sentry(&mut self, events: &EventAccumulator) {
        if !self.sentry.alive() {
            return;
        }
        if self.sentry.idle > 0 {
            self.sentry.idle -= 1;
            self.sentry.velocity = 0.0;
            return;
        }
        self.sentry.idle = TRAINER_IDLE_TURNS.saturating_sub(self.round);

        let distance = if self.sentry.forward {
            TRAINER_STEP
        } else {
            -TRAINER_STEP
        };
        let from = self.sentry.position;
        let (target, wall) = self.clamp(from.project(self.sentry.heading, distance));

        let contact = if self.agent.destroyed {
            None
        } else {
            geometry::first_contact(from, target, self.agent.position, BODY_SIZE)
        };
        if let Some(t) = contact {
            self.sentry.position = from.lerp(target, t);
            self.sentry.velocity = 0.0;
            self.sentry.reverse();
            self.ram(false, events);
            return;
        }

        self.sentry.position = target;
        if wall.is_some() {
            self.sentry.velocity = 0.0;
            self.sentry.reverse();
        } else {
            self.sentry.velocity = distance;
        }
    }

    /// Contact between the two bodies. `my_fault` is from the agent's side.
    fn ram(&mut self, my_fault: bool, events: &EventAccumulator) {
        self.agent.energy -= RAM_DAMAGE;
        self.sentry.energy -= RAM_DAMAGE;

        let bearing = geometry::absolute_bearing(self.agent.position, self.sentry.position);
        self.record(
            events,
            EventPayload::HitRobot {
                name: SENTRY_NAME.to_string(),
                bearing: geometry::normalize_relative(bearing - self.agent.heading),
                energy: self.sentry.energy.max(0.0),
                my_fault,
            },
        );
        if !self.sentry.alive() {
            self.kill_sentry(events);
        }
    }

    fn kill_sentry(&mut self, events: &EventAccumulator) {
        self.sentry.energy = 0.0;
        self.record(
            events,
            EventPayload::RobotDeath {
                name: SENTRY_NAME.to_string(),
            },
        );
        self.record(events, EventPayload::Win);
    }
}

/// Agent starts on the left, facing the sentry with gun and radar aligned.
fn spawn_agent(config: &ArenaConfig) -> Agent {
    Agent {
        position: Point::new(config.width * 0.25, config.height * 0.5),
        heading: 90.0,
        gun_heading: 90.0,
        radar_heading: 90.0,
        velocity: 0.0,
        energy: START_ENERGY,
        gun_heat: 0.0,
        destroyed: false,
        stopped: None,
    }
}

fn spawn_sentry(config: &ArenaConfig) -> Sentry {
    Sentry {
        position: Point::new(config.width * 0.75, config.height * 0.5),
        heading: 0.0,
        velocity: 0.0,
        energy: START_ENERGY,
        forward: true,
        idle: 0,
    }
}
