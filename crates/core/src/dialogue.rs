//! Interactive Turn Loop
//!
//! One turn: understand the utterance, let the policy decide, generate the
//! reply (or fall back to rule-based phrasing), print. The loop ends when the
//! user types `bye` in any case, or input runs out.

use serde::Serialize;
use std::fmt;
use std::io::{self, BufRead, Write};

use crate::fallback::{phrase_acts, UNPHRASED_RESPONSE};
use crate::nlg::Generator;
use crate::nlu::Understanding;
use crate::policy::Policy;
use crate::types::{display_acts, DialogueAct, Session};

/// Sentinel input that ends the session
pub const EXIT_COMMAND: &str = "bye";

const NO_ACTION_RESPONSE: &str = "I have an action, but couldn't generate a response text.";

/// True for `bye` in any letter case; only the line terminator is stripped
pub fn is_exit_command(input: &str) -> bool {
    strip_line_ending(input).to_lowercase() == EXIT_COMMAND
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(&['\n', '\r'][..])
}

// ============================================================================
// Turn State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingInput,
    Terminated,
}

/// Result of one turn, rendered as the line shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Exit command received
    Terminated,
    /// The generator phrased the system acts
    Generated { text: String },
    /// The generator failed; rule-based phrasing stood in
    Fallback { text: String },
    /// The generator failed and no act could be phrased
    Unphrased,
    /// The generator failed and the policy produced no acts
    NoAction,
    /// Understanding failed; turn abandoned
    NotUnderstood,
    /// Policy failed; turn abandoned
    NoDecision,
}

impl TurnOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnOutcome::Terminated)
    }
}

impl fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnOutcome::Terminated => write!(f, "System: Goodbye!"),
            TurnOutcome::Generated { text } => write!(f, "System: {}", text),
            TurnOutcome::Fallback { text } => write!(f, "System (fallback): {}", text),
            TurnOutcome::Unphrased => write!(f, "System: {}", UNPHRASED_RESPONSE),
            TurnOutcome::NoAction => write!(f, "System: {}", NO_ACTION_RESPONSE),
            TurnOutcome::NotUnderstood => write!(f, "System: I had trouble understanding that."),
            TurnOutcome::NoDecision => write!(f, "System: I'm not sure how to respond to that."),
        }
    }
}

/// Acts seen during the most recent turn
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnTrace {
    pub turn: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_acts: Option<Vec<DialogueAct>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_acts: Option<Vec<DialogueAct>>,
}

// ============================================================================
// Dialogue Session
// ============================================================================

/// Owns the three components and the policy session for one conversation
pub struct DialogueSession {
    nlu: Box<dyn Understanding>,
    policy: Box<dyn Policy>,
    nlg: Box<dyn Generator>,
    session: Session,
    state: LoopState,
    trace: TurnTrace,
}

impl DialogueSession {
    pub fn new(
        nlu: Box<dyn Understanding>,
        policy: Box<dyn Policy>,
        nlg: Box<dyn Generator>,
    ) -> Self {
        let session = policy.init_session();
        Self {
            nlu,
            policy,
            nlg,
            session,
            state: LoopState::AwaitingInput,
            trace: TurnTrace::default(),
        }
    }

    /// Reset the policy session and wait for input
    pub fn start(&mut self) {
        self.session = self.policy.init_session();
        self.state = LoopState::AwaitingInput;
        self.trace = TurnTrace::default();
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn trace(&self) -> &TurnTrace {
        &self.trace
    }

    /// Run one turn. Component failures become apology outcomes; the loop
    /// stays in `AwaitingInput` for every input except the exit command.
    pub fn handle_turn(&mut self, input: &str) -> TurnOutcome {
        if self.state == LoopState::Terminated {
            return TurnOutcome::Terminated;
        }

        let input = strip_line_ending(input);
        if is_exit_command(input) {
            self.state = LoopState::Terminated;
            return TurnOutcome::Terminated;
        }

        self.trace = TurnTrace {
            turn: self.session.turn + 1,
            ..TurnTrace::default()
        };

        let user_acts = match self.nlu.predict(input) {
            Ok(acts) => acts,
            Err(e) => {
                tracing::warn!(error = %e, "understanding failed");
                return TurnOutcome::NotUnderstood;
            }
        };
        tracing::debug!("understood user acts: {}", display_acts(&user_acts));
        self.trace.user_acts = Some(user_acts.clone());

        let system_acts = match self.policy.predict(&user_acts, self.session.clone()) {
            Ok((acts, mut session)) => {
                session.turn = self.session.turn + 1;
                self.session = session;
                acts
            }
            Err(e) => {
                tracing::warn!(error = %e, "policy failed");
                return TurnOutcome::NoDecision;
            }
        };
        tracing::debug!("policy decided system acts: {}", display_acts(&system_acts));
        self.trace.system_acts = Some(system_acts.clone());

        match self.nlg.generate(&system_acts) {
            Ok(text) => TurnOutcome::Generated { text },
            Err(e) => {
                tracing::warn!(error = %e, "generation failed");
                if system_acts.is_empty() {
                    TurnOutcome::NoAction
                } else {
                    match phrase_acts(&system_acts) {
                        Some(text) => TurnOutcome::Fallback { text },
                        None => TurnOutcome::Unphrased,
                    }
                }
            }
        }
    }

    /// Read-eval-print loop over any line source and sink.
    /// Only I/O errors end the loop early.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> io::Result<()> {
        self.start();

        writeln!(output, "\n--- Starting Dialogue Session ---")?;
        writeln!(output, "Type '{}' to end the session.", EXIT_COMMAND)?;

        loop {
            write!(output, "You: ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                // End of input ends the session quietly
                writeln!(output)?;
                self.state = LoopState::Terminated;
                break;
            }

            let outcome = self.handle_turn(&line);
            writeln!(output, "{}", outcome)?;

            if outcome.is_terminal() {
                break;
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
