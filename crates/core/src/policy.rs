//! Dialogue Policy
//!
//! Decides the system acts for a turn. The session is an explicit value:
//! created by `init_session`, moved into `predict` and handed back with the
//! system acts, so a failed turn leaves the caller's copy untouched.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::{ConfigError, PolicyError, RemoteError};
use crate::remote::{acts_at, extract_json_path, EndpointConfig, RemoteEndpoint};
use crate::types::{DialogueAct, Session};

pub trait Policy {
    /// Fresh state for a new conversation
    fn init_session(&self) -> Session;

    fn predict(
        &self,
        user_acts: &[DialogueAct],
        session: Session,
    ) -> Result<(Vec<DialogueAct>, Session), PolicyError>;
}

// ============================================================================
// Rule Stub
// ============================================================================

/// Slots the rule policy asks for before it considers a domain complete
const REQUIRED_SLOTS: &[(&str, &[&str])] = &[
    ("restaurant", &["area", "pricerange", "food"]),
    ("hotel", &["area", "pricerange"]),
    ("attraction", &["area"]),
];

/// What the rule policy remembers between turns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct BeliefState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_domain: Option<String>,

    /// domain -> slot -> value
    #[serde(default)]
    constraints: BTreeMap<String, BTreeMap<String, String>>,
}

impl BeliefState {
    fn from_session(session: &Session) -> Result<Self, PolicyError> {
        if session.state.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(session.state.clone())
            .map_err(|e| PolicyError::CorruptSession(e.to_string()))
    }

    /// Resolve the domain of a user act, falling back to the active one
    fn domain_for(&self, act: &DialogueAct) -> Option<String> {
        if act.has_domain() && act.domain() != "general" {
            Some(act.domain().to_string())
        } else {
            self.active_domain.clone()
        }
    }

    fn next_missing_slot(&self, domain: &str) -> Option<&'static str> {
        let filled = self.constraints.get(domain);
        REQUIRED_SLOTS
            .iter()
            .find(|(d, _)| *d == domain)
            .and_then(|(_, slots)| {
                slots
                    .iter()
                    .copied()
                    .find(|slot| filled.map_or(true, |f| !f.contains_key(*slot)))
            })
    }
}

/// Deterministic stand-in for a trained policy: tracks user constraints,
/// asks for missing ones, and confirms once a domain is complete
#[derive(Debug, Default, Clone)]
pub struct RulePolicy;

impl RulePolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Policy for RulePolicy {
    fn init_session(&self) -> Session {
        Session::new(Value::Null)
    }

    fn predict(
        &self,
        user_acts: &[DialogueAct],
        mut session: Session,
    ) -> Result<(Vec<DialogueAct>, Session), PolicyError> {
        let mut belief = BeliefState::from_session(&session)?;
        let mut system_acts = Vec::new();
        let mut constraint_turn = false;

        for act in user_acts {
            if act.is("greet") {
                system_acts.push(DialogueAct::new("greet", "general"));
                continue;
            }
            if act.is("thank") {
                system_acts.push(DialogueAct::new("welcome", "general"));
                continue;
            }
            if act.is("bye") {
                system_acts.push(DialogueAct::new("bye", "general"));
                continue;
            }

            let Some(domain) = belief.domain_for(act) else {
                continue;
            };
            belief.active_domain = Some(domain.clone());

            if act.is("inform") {
                constraint_turn = true;
                if let (Some(slot), true) = (act.slot(), act.has_concrete_value()) {
                    belief
                        .constraints
                        .entry(domain)
                        .or_default()
                        .insert(slot.to_string(), act.value().unwrap_or_default().to_string());
                }
            } else if act.is("request") {
                if let Some(slot) = act.slot() {
                    let known = belief.constraints.get(&domain).and_then(|c| c.get(slot));
                    let answer = match known {
                        Some(value) => DialogueAct::new("inform", domain.as_str())
                            .with_slot(slot)
                            .with_value(value.as_str()),
                        None => DialogueAct::new("nooffer", domain.as_str()).with_slot(slot),
                    };
                    system_acts.push(answer);
                }
            }
        }

        if constraint_turn {
            if let Some(domain) = belief.active_domain.clone() {
                system_acts.extend(next_step(&belief, &domain));
            }
        }

        if system_acts.is_empty() {
            system_acts.push(DialogueAct::new("reqmore", "general"));
        }

        session.state =
            serde_json::to_value(&belief).map_err(|e| PolicyError::CorruptSession(e.to_string()))?;
        Ok((system_acts, session))
    }
}

/// Ask for the next missing slot, or confirm the collected constraints
fn next_step(belief: &BeliefState, domain: &str) -> Vec<DialogueAct> {
    if let Some(slot) = belief.next_missing_slot(domain) {
        return vec![DialogueAct::new("request", domain).with_slot(slot).with_value("?")];
    }

    let mut acts: Vec<DialogueAct> = belief
        .constraints
        .get(domain)
        .into_iter()
        .flatten()
        .map(|(slot, value)| {
            DialogueAct::new("inform", domain)
                .with_slot(slot.as_str())
                .with_value(value.as_str())
        })
        .collect();

    if acts.is_empty() {
        acts.push(DialogueAct::new("inform", domain));
    }
    acts.push(DialogueAct::new("reqmore", "general"));
    acts
}

// ============================================================================
// HTTP Backend
// ============================================================================

/// Policy served over HTTP: `{"acts": [...], "session": <state>}` in,
/// acts plus an optional replacement session state out
#[derive(Debug, Clone)]
pub struct HttpPolicy {
    endpoint: RemoteEndpoint,
}

impl HttpPolicy {
    pub fn new(config: EndpointConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: RemoteEndpoint::new(config, "$.acts")?,
        })
    }

    /// Acts at `acts_path`; a `$.session` field, when present, replaces the state
    pub fn read_response(
        response: &Value,
        acts_path: &str,
        mut session: Session,
    ) -> Result<(Vec<DialogueAct>, Session), PolicyError> {
        let system_acts = acts_at(response, acts_path)?;
        match extract_json_path(response, "$.session") {
            Ok(state) => session.state = state.clone(),
            Err(RemoteError::Path { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        Ok((system_acts, session))
    }
}

impl Policy for HttpPolicy {
    fn init_session(&self) -> Session {
        Session::new(Value::Null)
    }

    fn predict(
        &self,
        user_acts: &[DialogueAct],
        session: Session,
    ) -> Result<(Vec<DialogueAct>, Session), PolicyError> {
        let body = json!({ "acts": user_acts, "session": session.state });
        let response = self.endpoint.call(&body)?;

        Self::read_response(&response, self.endpoint.response_path(), session)
    }
}
