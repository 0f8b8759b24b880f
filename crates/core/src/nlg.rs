//! Natural Language Generation
//!
//! Turns system acts into display text. Generators fail when they cannot
//! phrase an act; the turn loop then falls back to `format_fallback`.

use serde_json::{json, Value};

use crate::error::{ConfigError, GeneratorError, RemoteError};
use crate::remote::{extract_json_path, EndpointConfig, RemoteEndpoint};
use crate::types::{display_acts, DialogueAct};

pub trait Generator {
    fn generate(&self, acts: &[DialogueAct]) -> Result<String, GeneratorError>;
}

// ============================================================================
// Template Stub
// ============================================================================

/// Fixed sentences for general-domain acts
const GENERAL_TEMPLATES: &[(&str, &str)] = &[
    ("greet", "Hello, what can I help you with?"),
    ("welcome", "You're welcome. Is there anything else I can help with?"),
    ("bye", "Goodbye."),
    ("reqmore", "Is there anything else I can help you with?"),
];

/// How slots read in a sentence
const SLOT_PHRASES: &[(&str, &str)] = &[
    ("area", "area"),
    ("pricerange", "price range"),
    ("food", "type of food"),
];

/// Small template table; acts outside it are reported as `NoTemplate`
#[derive(Debug, Default, Clone)]
pub struct TemplateNlg;

impl TemplateNlg {
    pub fn new() -> Self {
        Self
    }

    fn sentence(&self, act: &DialogueAct) -> Option<String> {
        if act.domain() == "general" {
            return GENERAL_TEMPLATES
                .iter()
                .find(|(act_type, _)| act.is(act_type))
                .map(|(_, text)| text.to_string());
        }

        let phrase = act.slot().and_then(slot_phrase)?;
        if act.is("request") {
            Some(format!("What {} would you like for the {}?", phrase, act.domain()))
        } else if act.is("inform") && act.has_concrete_value() {
            Some(format!(
                "The {} {} is {}.",
                act.domain(),
                phrase,
                act.value().unwrap_or_default()
            ))
        } else {
            None
        }
    }
}

fn slot_phrase(slot: &str) -> Option<&'static str> {
    SLOT_PHRASES
        .iter()
        .find(|(s, _)| *s == slot)
        .map(|(_, phrase)| *phrase)
}

impl Generator for TemplateNlg {
    fn generate(&self, acts: &[DialogueAct]) -> Result<String, GeneratorError> {
        if acts.is_empty() {
            return Err(GeneratorError::NoTemplate(display_acts(acts)));
        }

        let sentences = acts
            .iter()
            .map(|act| {
                self.sentence(act)
                    .ok_or_else(|| GeneratorError::NoTemplate(act.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sentences.join(" "))
    }
}

// ============================================================================
// HTTP Backend
// ============================================================================

/// Generation served over HTTP: `{"acts": [...]}` in, text out
#[derive(Debug, Clone)]
pub struct HttpNlg {
    endpoint: RemoteEndpoint,
}

impl HttpNlg {
    pub fn new(config: EndpointConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: RemoteEndpoint::new(config, "$.text")?,
        })
    }

    /// The text at `path`, which must be a non-blank string
    pub fn read_text(response: &Value, path: &str) -> Result<String, GeneratorError> {
        match extract_json_path(response, path)? {
            Value::String(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            other => Err(RemoteError::Path {
                path: path.to_string(),
                reason: format!("expected non-empty text, got {}", other),
            }
            .into()),
        }
    }
}

impl Generator for HttpNlg {
    fn generate(&self, acts: &[DialogueAct]) -> Result<String, GeneratorError> {
        let response = self.endpoint.call(&json!({ "acts": acts }))?;
        Self::read_text(&response, self.endpoint.response_path())
    }
}
