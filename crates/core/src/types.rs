//! Dialogue acts and session state shared by every component
//!
//! This module contains:
//! - `DialogueAct`, the flat (type, domain, slot, value) record
//! - Wire conversion for the positional array form used by dialogue toolkits
//! - `Session`, the policy state threaded through each turn

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Values that mean "no concrete value was given"
pub const SENTINEL_VALUES: [&str; 3] = ["?", "none", "dontcare"];

// ============================================================================
// Dialogue Act
// ============================================================================

/// One semantic unit of communication, e.g. `inform(restaurant, area=centre)`.
///
/// Fields are normalized on construction: surrounding whitespace is trimmed
/// and an empty slot or value is stored as absent. An empty `act_type` or
/// `domain` is kept as-is and simply fails presence checks downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawAct")]
pub struct DialogueAct {
    act_type: String,
    domain: String,
    slot: Option<String>,
    value: Option<String>,
}

impl DialogueAct {
    pub fn new(act_type: impl Into<String>, domain: impl Into<String>) -> Self {
        Self::from_parts(Some(act_type.into()), Some(domain.into()), None, None)
    }

    /// Build an act from possibly-missing fields
    pub fn from_parts(
        act_type: Option<String>,
        domain: Option<String>,
        slot: Option<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            act_type: act_type.map(|s| s.trim().to_string()).unwrap_or_default(),
            domain: domain.map(|s| s.trim().to_string()).unwrap_or_default(),
            slot: non_empty(slot),
            value: non_empty(value),
        }
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = non_empty(Some(slot.into()));
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = non_empty(Some(value.into()));
        self
    }

    pub fn act_type(&self) -> &str {
        &self.act_type
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn slot(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn has_act_type(&self) -> bool {
        !self.act_type.is_empty()
    }

    pub fn has_domain(&self) -> bool {
        !self.domain.is_empty()
    }

    /// True when the value is present and is not one of the sentinel markers
    pub fn has_concrete_value(&self) -> bool {
        self.value().is_some_and(|v| !is_sentinel(v))
    }

    /// Case-insensitive act type comparison
    pub fn is(&self, act_type: &str) -> bool {
        self.act_type.eq_ignore_ascii_case(act_type)
    }
}

impl fmt::Display for DialogueAct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.act_type, self.domain)?;
        match (&self.slot, &self.value) {
            (Some(slot), Some(value)) => write!(f, ", {}={}", slot, value)?,
            (Some(slot), None) => write!(f, ", {}", slot)?,
            (None, Some(value)) => write!(f, ", ={}", value)?,
            (None, None) => {}
        }
        write!(f, ")")
    }
}

/// Render a sequence of acts for log lines
pub fn display_acts(acts: &[DialogueAct]) -> String {
    let parts: Vec<String> = acts.iter().map(|a| a.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

pub fn is_sentinel(value: &str) -> bool {
    SENTINEL_VALUES.contains(&value)
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ============================================================================
// Wire Format
// ============================================================================

/// Acts arrive either positionally (`["inform", "hotel", "area", "north"]`,
/// possibly shorter) or as named fields.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAct {
    Positional(Vec<Value>),
    Named {
        #[serde(default, alias = "intent", alias = "type")]
        act_type: Option<Value>,
        #[serde(default)]
        domain: Option<Value>,
        #[serde(default)]
        slot: Option<Value>,
        #[serde(default)]
        value: Option<Value>,
    },
}

impl From<RawAct> for DialogueAct {
    fn from(raw: RawAct) -> Self {
        match raw {
            RawAct::Positional(items) => {
                let mut fields = items.into_iter().map(field_to_string);
                let act_type = fields.next().flatten();
                let domain = fields.next().flatten();
                let slot = fields.next().flatten();
                let value = fields.next().flatten();
                DialogueAct::from_parts(act_type, domain, slot, value)
            }
            RawAct::Named {
                act_type,
                domain,
                slot,
                value,
            } => DialogueAct::from_parts(
                act_type.and_then(field_to_string),
                domain.and_then(field_to_string),
                slot.and_then(field_to_string),
                value.and_then(field_to_string),
            ),
        }
    }
}

fn field_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Always written in the positional form, with `null` for absent fields
impl Serialize for DialogueAct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.act_type, &self.domain, &self.slot, &self.value).serialize(serializer)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Policy state carried from one turn to the next.
///
/// Created by `Policy::init_session`, moved into each `Policy::predict` call
/// and handed back with the system acts. `state` is owned by the policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub turn: u32,

    #[serde(default)]
    pub state: Value,
}

impl Session {
    pub fn new(state: Value) -> Self {
        Self { turn: 0, state }
    }
}

// ============================================================================
// Tests
// ============================================================================
