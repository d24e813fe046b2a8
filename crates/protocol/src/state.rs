//! State readings reported to the policy server.
//!
//! A [`State`] is a snapshot, not a diff: it is rebuilt from scratch on every
//! report and always carries every [`StateField`], with `null` standing in for
//! readings the simulation could not provide. The receiver depends on a stable
//! key set, so adding or removing a field bumps [`STATE_SCHEMA_VERSION`].
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Version of the [`StateField`] list.
pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Named reading taken from the simulation on every report.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
    strum::EnumCount,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateField {
    BattleFieldHeight,
    BattleFieldWidth,
    Energy,
    GunCoolingRate,
    GunHeading,
    GunHeat,
    Heading,
    Height,
    NumRounds,
    NumSentries,
    /// Number of opponents still alive.
    Others,
    RadarHeading,
    RoundNum,
    SentryBorderSize,
    /// Simulation turn counter.
    Time,
    Velocity,
    Width,
    X,
    Y,
    /// Most recent scan result, if any entity has been scanned this round.
    LastScanned,
}

/// Scalar or composite value of a single [`StateField`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Entity(ScannedEntity),
}

impl Reading {
    /// Numeric view of the reading; `None` for flags and composites.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Integer(value) => Some(*value as f64),
            Reading::Number(value) => Some(*value),
            Reading::Flag(_) | Reading::Entity(_) => None,
        }
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Reading::Number(value)
    }
}

impl From<i64> for Reading {
    fn from(value: i64) -> Self {
        Reading::Integer(value)
    }
}

impl From<bool> for Reading {
    fn from(value: bool) -> Self {
        Reading::Flag(value)
    }
}

impl From<ScannedEntity> for Reading {
    fn from(value: ScannedEntity) -> Self {
        Reading::Entity(value)
    }
}

/// Composite reading describing an entity observed by the radar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScannedEntity {
    pub name: String,
    /// Bearing relative to the agent's heading, in degrees.
    pub bearing: f64,
    pub distance: f64,
    pub heading: f64,
    pub velocity: f64,
    pub energy: f64,
    /// Turn in which the scan happened.
    pub time: u64,
}

/// Full state snapshot keyed by [`StateField`].
///
/// Absent readings are stored as `None` and serialize as JSON `null`; keys are
/// never omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(BTreeMap<StateField, Option<Reading>>);

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `reading` for `field`, replacing any previous value.
    pub fn insert(&mut self, field: StateField, reading: Option<Reading>) {
        self.0.insert(field, reading);
    }

    /// Returns the reading for `field`, or `None` when missing or null.
    pub fn get(&self, field: StateField) -> Option<&Reading> {
        self.0.get(&field).and_then(Option::as_ref)
    }

    /// Returns true if `field` has a key in the snapshot (even if null).
    pub fn contains(&self, field: StateField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateField, Option<&Reading>)> {
        self.0.iter().map(|(field, reading)| (*field, reading.as_ref()))
    }
}
