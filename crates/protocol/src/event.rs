//! Simulation events and the per-kind buffer they are reported in.
//!
//! The event set is closed. Each [`EventKind`] has an explicit wire name (the
//! names the policy server already understands, e.g. `ScannedRobotEvent`) and
//! a fixed terminal classification; nothing here is derived from type names at
//! runtime.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Kind tag of an [`Event`].
///
/// The strum serialization strings are the wire names used both for the
/// `kind` field of a serialized event and for the keys of an [`EventBuffer`].
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
pub enum EventKind {
    #[strum(serialize = "HitWallEvent")]
    HitWall,
    #[strum(serialize = "HitRobotEvent")]
    HitRobot,
    #[strum(serialize = "HitByBulletEvent")]
    HitByBullet,
    #[strum(serialize = "BulletHitEvent")]
    BulletHit,
    #[strum(serialize = "BulletHitBulletEvent")]
    BulletHitBullet,
    #[strum(serialize = "BulletMissedEvent")]
    BulletMissed,
    #[strum(serialize = "DeathEvent")]
    Death,
    #[strum(serialize = "RobotDeathEvent")]
    RobotDeath,
    #[strum(serialize = "RoundEndedEvent")]
    RoundEnded,
    #[strum(serialize = "BattleEndedEvent")]
    BattleEnded,
    #[strum(serialize = "WinEvent")]
    Win,
    #[strum(serialize = "ScannedRobotEvent")]
    ScannedRobot,
    #[strum(serialize = "BulletFiredEvent")]
    BulletFired,
}

impl EventKind {
    /// Returns true if an event of this kind ends the episode.
    ///
    /// `RobotDeath` reports another entity's destruction and is not terminal.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Death | Self::Win | Self::RoundEnded | Self::BattleEnded
        )
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        EventKind::from_str(&name)
            .map_err(|_| serde::de::Error::custom(format!("unknown event kind `{}`", name)))
    }
}

/// Projectile handle as reported by the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub owner: String,
    pub victim: Option<String>,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub power: f64,
    pub active: bool,
}

/// Event captured from the simulation, immutable once recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Simulation turn in which the event fired.
    pub time: u64,
    #[serde(flatten)]
    pub payload: EventPayload,
}

/// Kind-specific event data.
///
/// The serde tag names must match the [`EventKind`] wire names; see
/// [`Event::kind`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EventPayload {
    #[serde(rename = "HitWallEvent")]
    HitWall { bearing: f64 },
    #[serde(rename = "HitRobotEvent")]
    HitRobot {
        name: String,
        bearing: f64,
        energy: f64,
        my_fault: bool,
    },
    #[serde(rename = "HitByBulletEvent")]
    HitByBullet {
        /// Entity that fired the bullet.
        name: String,
        bearing: f64,
        power: f64,
        damage: f64,
    },
    #[serde(rename = "BulletHitEvent")]
    BulletHit {
        /// Entity that was hit.
        name: String,
        energy: f64,
        damage: f64,
        bullet: Bullet,
    },
    #[serde(rename = "BulletHitBulletEvent")]
    BulletHitBullet { bullet: Bullet, hit_bullet: Bullet },
    #[serde(rename = "BulletMissedEvent")]
    BulletMissed { bullet: Bullet },
    #[serde(rename = "DeathEvent")]
    Death,
    #[serde(rename = "RobotDeathEvent")]
    RobotDeath { name: String },
    #[serde(rename = "RoundEndedEvent")]
    RoundEnded {
        round: u32,
        turns: u64,
        total_turns: u64,
    },
    #[serde(rename = "BattleEndedEvent")]
    BattleEnded { aborted: bool },
    #[serde(rename = "WinEvent")]
    Win,
    #[serde(rename = "ScannedRobotEvent")]
    ScannedRobot {
        name: String,
        bearing: f64,
        distance: f64,
        heading: f64,
        velocity: f64,
        energy: f64,
    },
    #[serde(rename = "BulletFiredEvent")]
    BulletFired { bullet: Bullet },
}

impl Event {
    pub fn new(time: u64, payload: EventPayload) -> Self {
        Self { time, payload }
    }

    pub fn kind(&self) -> EventKind {
        match &self.payload {
            EventPayload::HitWall { .. } => EventKind::HitWall,
            EventPayload::HitRobot { .. } => EventKind::HitRobot,
            EventPayload::HitByBullet { .. } => EventKind::HitByBullet,
            EventPayload::BulletHit { .. } => EventKind::BulletHit,
            EventPayload::BulletHitBullet { .. } => EventKind::BulletHitBullet,
            EventPayload::BulletMissed { .. } => EventKind::BulletMissed,
            EventPayload::Death => EventKind::Death,
            EventPayload::RobotDeath { .. } => EventKind::RobotDeath,
            EventPayload::RoundEnded { .. } => EventKind::RoundEnded,
            EventPayload::BattleEnded { .. } => EventKind::BattleEnded,
            EventPayload::Win => EventKind::Win,
            EventPayload::ScannedRobot { .. } => EventKind::ScannedRobot,
            EventPayload::BulletFired { .. } => EventKind::BulletFired,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind(), self.time)
    }
}

/// Events grouped by kind, in capture order within each kind.
///
/// Kinds without events have no key; an empty buffer serializes as `{}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventBuffer(BTreeMap<EventKind, Vec<Event>>);

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event` to the bucket for its kind.
    pub fn push(&mut self, event: Event) {
        self.0.entry(event.kind()).or_default().push(event);
    }

    /// Events of `kind` in capture order; empty when none were captured.
    pub fn of_kind(&self, kind: EventKind) -> &[Event] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.0.contains_key(&kind)
    }

    /// First terminal kind present in the buffer, if any.
    pub fn terminal_kind(&self) -> Option<EventKind> {
        self.0.keys().copied().find(EventKind::is_terminal)
    }

    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.0.keys().copied()
    }

    /// Total number of events across all kinds.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.0.values().flatten()
    }
}

impl FromIterator<Event> for EventBuffer {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut buffer = Self::new();
        for event in iter {
            buffer.push(event);
        }
        buffer
    }
}
