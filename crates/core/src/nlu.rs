//! Natural Language Understanding
//!
//! Maps a user utterance to dialogue acts. `HttpNlu` forwards to a served
//! model; `KeywordNlu` is a heuristic stand-in for offline runs.

use serde_json::json;

use crate::error::{ConfigError, UnderstandingError};
use crate::remote::{acts_at, EndpointConfig, RemoteEndpoint};
use crate::types::DialogueAct;

/// Raw text in, user acts out
pub trait Understanding {
    fn predict(&self, utterance: &str) -> Result<Vec<DialogueAct>, UnderstandingError>;
}

// ============================================================================
// Keyword Stub
// ============================================================================

/// Domain keywords, checked in order; the first hit names the domain
const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("restaurant", &["restaurant", "food", "eat", "dinner", "lunch"]),
    ("hotel", &["hotel", "stay", "room", "guesthouse"]),
    ("train", &["train"]),
    ("taxi", &["taxi", "cab"]),
    ("attraction", &["attraction", "museum", "visit"]),
];

/// (slot, surface word, canonical value)
const SLOT_VALUES: &[(&str, &str, &str)] = &[
    ("area", "centre", "centre"),
    ("area", "center", "centre"),
    ("area", "north", "north"),
    ("area", "south", "south"),
    ("area", "east", "east"),
    ("area", "west", "west"),
    ("pricerange", "cheap", "cheap"),
    ("pricerange", "moderate", "moderate"),
    ("pricerange", "moderately", "moderate"),
    ("pricerange", "expensive", "expensive"),
    ("food", "chinese", "chinese"),
    ("food", "indian", "indian"),
    ("food", "italian", "italian"),
    ("food", "thai", "thai"),
    ("food", "british", "british"),
    ("food", "french", "french"),
];

/// (surface word, requestable slot)
const REQUESTABLES: &[(&str, &str)] = &[
    ("address", "address"),
    ("phone", "phone"),
    ("postcode", "postcode"),
    ("reference", "ref"),
];

const QUESTION_WORDS: &[&str] = &["what", "where", "which", "could", "can", "how"];

/// Simple heuristic understanding for testing the loop without a model
#[derive(Debug, Default, Clone)]
pub struct KeywordNlu;

impl KeywordNlu {
    pub fn new() -> Self {
        Self
    }
}

impl Understanding for KeywordNlu {
    fn predict(&self, utterance: &str) -> Result<Vec<DialogueAct>, UnderstandingError> {
        let t = utterance.trim().to_lowercase();
        if t.is_empty() {
            return Err(UnderstandingError::EmptyUtterance);
        }

        let words: Vec<&str> = t
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has_word = |w: &str| words.contains(&w);

        let mut acts = Vec::new();

        if ["hello", "hi", "hey"].iter().any(|w| has_word(*w)) {
            acts.push(DialogueAct::new("greet", "general"));
        }
        if has_word("thanks") || has_word("thank") {
            acts.push(DialogueAct::new("thank", "general"));
        }

        // Undetected domain stays empty; the policy resolves it from context
        let domain = DOMAIN_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| has_word(*k)))
            .map(|(domain, _)| *domain)
            .unwrap_or_default();

        let informs: Vec<DialogueAct> = SLOT_VALUES
            .iter()
            .filter(|(_, word, _)| has_word(*word))
            .map(|(slot, _, value)| DialogueAct::new("inform", domain).with_slot(*slot).with_value(*value))
            .collect();

        let is_question = t.contains('?') || QUESTION_WORDS.iter().any(|w| words.first() == Some(w));
        let requests: Vec<DialogueAct> = if is_question {
            REQUESTABLES
                .iter()
                .filter(|(word, _)| has_word(*word))
                .map(|(_, slot)| DialogueAct::new("request", domain).with_slot(*slot).with_value("?"))
                .collect()
        } else {
            Vec::new()
        };

        if informs.is_empty() && requests.is_empty() && !domain.is_empty() {
            acts.push(DialogueAct::new("inform", domain));
        }
        acts.extend(informs);
        acts.extend(requests);

        Ok(acts)
    }
}

// ============================================================================
// HTTP Backend
// ============================================================================

/// Understanding served over HTTP: `{"utterance": ...}` in, acts out
#[derive(Debug, Clone)]
pub struct HttpNlu {
    endpoint: RemoteEndpoint,
}

impl HttpNlu {
    pub fn new(config: EndpointConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: RemoteEndpoint::new(config, "$.acts")?,
        })
    }
}

impl Understanding for HttpNlu {
    fn predict(&self, utterance: &str) -> Result<Vec<DialogueAct>, UnderstandingError> {
        if utterance.trim().is_empty() {
            return Err(UnderstandingError::EmptyUtterance);
        }
        let response = self.endpoint.call(&json!({ "utterance": utterance }))?;
        Ok(acts_at(&response, self.endpoint.response_path())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inform(domain: &str, slot: &str, value: &str) -> DialogueAct {
        DialogueAct::new("inform", domain).with_slot(slot).with_value(value)
    }

    #[test]
    fn test_keyword_informs() {
        let acts = KeywordNlu::new()
            .predict("I want a cheap restaurant in the centre")
            .unwrap();
        assert_eq!(
            acts,
            vec![
                inform("restaurant", "area", "centre"),
                inform("restaurant", "pricerange", "cheap"),
            ]
        );
    }

    #[test]
    fn test_keyword_greeting_and_domain_only() {
        let acts = KeywordNlu::new().predict("Hi, I need a hotel").unwrap();
        assert_eq!(
            acts,
            vec![DialogueAct::new("greet", "general"), DialogueAct::new("inform", "hotel")]
        );
    }

    #[test]
    fn test_keyword_request_needs_question() {
        let nlu = KeywordNlu::new();

        let acts = nlu.predict("What is the address of the hotel?").unwrap();
        assert_eq!(
            acts,
            vec![DialogueAct::new("request", "hotel").with_slot("address").with_value("?")]
        );

        let acts = nlu.predict("the address is fine").unwrap();
        assert!(acts.is_empty());
    }

    #[test]
    fn test_keyword_slot_without_domain() {
        let acts = KeywordNlu::new().predict("somewhere in the north please").unwrap();
        assert_eq!(acts.len(), 1);
        assert!(!acts[0].has_domain());
        assert_eq!(acts[0].value(), Some("north"));
    }

    #[test]
    fn test_keyword_unrecognized_is_empty() {
        let acts = KeywordNlu::new().predict("blue sky thinking").unwrap();
        assert!(acts.is_empty());
    }

    #[test]
    fn test_empty_utterance_fails() {
        assert!(matches!(
            KeywordNlu::new().predict("   "),
            Err(UnderstandingError::EmptyUtterance)
        ));
    }

    #[test]
    fn test_http_nlu_rejects_bad_url() {
        assert!(HttpNlu::new(EndpointConfig::new("not-a-url")).is_err());
    }

    /// Run with: cargo test test_http_nlu_integration -- --ignored
    /// Requires an understanding service at http://localhost:8000/nlu
    #[test]
    #[ignore]
    fn test_http_nlu_integration() {
        let nlu = HttpNlu::new(EndpointConfig::new("http://localhost:8000/nlu")).unwrap();
        let acts = nlu.predict("I want a cheap hotel").unwrap();
        assert!(!acts.is_empty());
    }
}
