//! Action vocabulary understood by the dispatcher.
//!
//! Actions arrive as `{"name": <string>, "value": <number|boolean|absent>}`.
//! Decoding is strict about values and lenient about names:
//! - a known name with a missing or wrong-typed value is an
//!   [`ActionDecodeError`], never coerced
//! - an unknown name decodes to [`Action::Unrecognized`] so agents tolerate
//!   vocabulary skew with newer servers
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Version of the [`ActionName`] vocabulary. Bump when a verb is added.
pub const PROTOCOL_VERSION: u32 = 1;

/// Wire names of the known verbs.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "camelCase")]
pub enum ActionName {
    DoNothing,
    Ahead,
    Back,
    TurnLeft,
    TurnRight,
    TurnRadarLeft,
    TurnRadarRight,
    SetAdjustRadarForRobotTurn,
    SetAdjustRadarForGunTurn,
    Scan,
    TurnGunLeft,
    TurnGunRight,
    SetAdjustGunForRobotTurn,
    Fire,
    Stop,
    Resume,
}

/// Shape of the value a verb expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    None,
    Number,
    Boolean,
}

impl ActionName {
    pub const fn value_kind(&self) -> ValueKind {
        match self {
            Self::DoNothing | Self::Scan | Self::Resume => ValueKind::None,
            Self::Ahead
            | Self::Back
            | Self::TurnLeft
            | Self::TurnRight
            | Self::TurnRadarLeft
            | Self::TurnRadarRight
            | Self::TurnGunLeft
            | Self::TurnGunRight
            | Self::Fire => ValueKind::Number,
            Self::SetAdjustRadarForRobotTurn
            | Self::SetAdjustRadarForGunTurn
            | Self::SetAdjustGunForRobotTurn
            | Self::Stop => ValueKind::Boolean,
        }
    }
}

/// Decoded action, validated against its verb's value shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub enum Action {
    DoNothing,
    /// Move forward by a distance.
    Ahead(f64),
    /// Move backward by a distance.
    Back(f64),
    /// Rotate the body, in degrees.
    TurnLeft(f64),
    TurnRight(f64),
    TurnRadarLeft(f64),
    TurnRadarRight(f64),
    SetAdjustRadarForRobotTurn(bool),
    SetAdjustRadarForGunTurn(bool),
    Scan,
    TurnGunLeft(f64),
    TurnGunRight(f64),
    SetAdjustGunForRobotTurn(bool),
    /// Fire a bullet with the given power.
    Fire(f64),
    /// Halt all movement; the flag overwrites a previously saved stop.
    Stop(bool),
    Resume,
    /// Name outside the vocabulary; dispatching it is a no-op.
    Unrecognized(String),
}

impl Action {
    /// Known verb of this action, `None` for [`Action::Unrecognized`].
    pub fn name(&self) -> Option<ActionName> {
        let name = match self {
            Action::DoNothing => ActionName::DoNothing,
            Action::Ahead(_) => ActionName::Ahead,
            Action::Back(_) => ActionName::Back,
            Action::TurnLeft(_) => ActionName::TurnLeft,
            Action::TurnRight(_) => ActionName::TurnRight,
            Action::TurnRadarLeft(_) => ActionName::TurnRadarLeft,
            Action::TurnRadarRight(_) => ActionName::TurnRadarRight,
            Action::SetAdjustRadarForRobotTurn(_) => ActionName::SetAdjustRadarForRobotTurn,
            Action::SetAdjustRadarForGunTurn(_) => ActionName::SetAdjustRadarForGunTurn,
            Action::Scan => ActionName::Scan,
            Action::TurnGunLeft(_) => ActionName::TurnGunLeft,
            Action::TurnGunRight(_) => ActionName::TurnGunRight,
            Action::SetAdjustGunForRobotTurn(_) => ActionName::SetAdjustGunForRobotTurn,
            Action::Fire(_) => ActionName::Fire,
            Action::Stop(_) => ActionName::Stop,
            Action::Resume => ActionName::Resume,
            Action::Unrecognized(_) => return None,
        };
        Some(name)
    }

    /// Wire name as received, including unrecognized names.
    pub fn wire_name(&self) -> &str {
        match self {
            Action::Unrecognized(raw) => raw,
            known => known.name().map(<&'static str>::from).unwrap_or_default(),
        }
    }

    fn value(&self) -> Option<Value> {
        match self {
            Action::Ahead(v)
            | Action::Back(v)
            | Action::TurnLeft(v)
            | Action::TurnRight(v)
            | Action::TurnRadarLeft(v)
            | Action::TurnRadarRight(v)
            | Action::TurnGunLeft(v)
            | Action::TurnGunRight(v)
            | Action::Fire(v) => Some(Value::from(*v)),
            Action::SetAdjustRadarForRobotTurn(flag)
            | Action::SetAdjustRadarForGunTurn(flag)
            | Action::SetAdjustGunForRobotTurn(flag)
            | Action::Stop(flag) => Some(Value::Bool(*flag)),
            Action::DoNothing | Action::Scan | Action::Resume | Action::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{}({})", self.wire_name(), value),
            None => write!(f, "{}", self.wire_name()),
        }
    }
}

/// Undecoded action message as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawAction {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        let value = action.value();
        let name = match action {
            Action::Unrecognized(name) => name,
            known => known.wire_name().to_string(),
        };
        RawAction { name, value }
    }
}

impl TryFrom<RawAction> for Action {
    type Error = ActionDecodeError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let Ok(name) = ActionName::from_str(&raw.name) else {
            return Ok(Action::Unrecognized(raw.name));
        };
        let value = raw.value.as_ref();

        let action = match name {
            ActionName::DoNothing => Action::DoNothing,
            ActionName::Ahead => Action::Ahead(number(name, value)?),
            ActionName::Back => Action::Back(number(name, value)?),
            ActionName::TurnLeft => Action::TurnLeft(number(name, value)?),
            ActionName::TurnRight => Action::TurnRight(number(name, value)?),
            ActionName::TurnRadarLeft => Action::TurnRadarLeft(number(name, value)?),
            ActionName::TurnRadarRight => Action::TurnRadarRight(number(name, value)?),
            ActionName::SetAdjustRadarForRobotTurn => {
                Action::SetAdjustRadarForRobotTurn(flag(name, value)?)
            }
            ActionName::SetAdjustRadarForGunTurn => {
                Action::SetAdjustRadarForGunTurn(flag(name, value)?)
            }
            ActionName::Scan => Action::Scan,
            ActionName::TurnGunLeft => Action::TurnGunLeft(number(name, value)?),
            ActionName::TurnGunRight => Action::TurnGunRight(number(name, value)?),
            ActionName::SetAdjustGunForRobotTurn => {
                Action::SetAdjustGunForRobotTurn(flag(name, value)?)
            }
            ActionName::Fire => Action::Fire(number(name, value)?),
            ActionName::Stop => Action::Stop(flag(name, value)?),
            ActionName::Resume => Action::Resume,
        };
        Ok(action)
    }
}

fn number(name: ActionName, value: Option<&Value>) -> Result<f64, ActionDecodeError> {
    match value {
        Some(Value::Number(number)) => number.as_f64().ok_or(ActionDecodeError::WrongType {
            name,
            expected: ValueKind::Number,
            found: "out-of-range number",
        }),
        Some(other) => Err(ActionDecodeError::WrongType {
            name,
            expected: ValueKind::Number,
            found: json_type(other),
        }),
        None => Err(ActionDecodeError::MissingValue {
            name,
            expected: ValueKind::Number,
        }),
    }
}

fn flag(name: ActionName, value: Option<&Value>) -> Result<bool, ActionDecodeError> {
    match value {
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(other) => Err(ActionDecodeError::WrongType {
            name,
            expected: ValueKind::Boolean,
            found: json_type(other),
        }),
        None => Err(ActionDecodeError::MissingValue {
            name,
            expected: ValueKind::Boolean,
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Value-shape violation for a known verb.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionDecodeError {
    #[error("action `{name}` requires a {expected} value")]
    MissingValue { name: ActionName, expected: ValueKind },

    #[error("action `{name}` expects a {expected} value, got {found}")]
    WrongType {
        name: ActionName,
        expected: ValueKind,
        found: &'static str,
    },
}

/// Response body of the `get-action` endpoint: `{"action": {...} | null}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    #[serde(default)]
    pub action: Option<Action>,
}
