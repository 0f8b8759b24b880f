//! Fallback Response Formatter
//!
//! Rule-based phrasing used when the generator cannot produce text for a set
//! of system acts. Pure and infallible: acts with missing fields contribute
//! nothing instead of failing.

use crate::types::DialogueAct;

/// Returned when none of the acts could be phrased
pub const UNPHRASED_RESPONSE: &str = "I have a response, but couldn't phrase it clearly.";

/// Phrase a sequence of system acts as one sentence.
///
/// Each act is rendered by the first matching rule:
/// 1. concrete value: `<domain> <slot> is <value>`
/// 2. request with a slot: `Could you tell me about <domain> <slot>?`
/// 3. type, domain and slot: `<act_type> <domain> <slot>`
/// 4. type and domain: `<act_type> for <domain>`
///
/// Renderings are joined with `". "`.
pub fn format_fallback(acts: &[DialogueAct]) -> String {
    phrase_acts(acts).unwrap_or_else(|| UNPHRASED_RESPONSE.to_string())
}

/// Like `format_fallback`, but `None` when no act matched a rule
pub fn phrase_acts(acts: &[DialogueAct]) -> Option<String> {
    let parts: Vec<String> = acts.iter().filter_map(phrase_act).collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(". "))
    }
}

fn phrase_act(act: &DialogueAct) -> Option<String> {
    // A concrete value wins even for request acts
    if act.has_concrete_value() {
        let value = act.value().unwrap_or_default();
        let subject = match act.slot() {
            Some(slot) => format!("{} {}", act.domain(), slot),
            None => act.domain().to_string(),
        };
        let subject = subject.trim();
        if subject.is_empty() {
            return Some(format!("is {}", value));
        }
        return Some(format!("{} is {}", subject, value));
    }

    match act.slot() {
        Some(slot) if act.is("request") && act.has_domain() => {
            Some(format!("Could you tell me about {} {}?", act.domain(), slot))
        }
        Some(slot) if act.has_act_type() && act.has_domain() => {
            let mut text = format!("{} {} {}", act.act_type(), act.domain(), slot);
            if act.has_concrete_value() {
                text.push(' ');
                text.push_str(act.value().unwrap_or_default());
            }
            Some(text)
        }
        _ if act.has_act_type() && act.has_domain() => {
            Some(format!("{} for {}", act.act_type(), act.domain()))
        }
        _ => None,
    }
}
