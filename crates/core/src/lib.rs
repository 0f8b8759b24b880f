//! Dialogue Loop Core Library
//!
//! This crate provides the pieces of a terminal dialogue session:
//! - Dialogue acts and the policy session (`types`)
//! - Understanding, policy and generation components (stub and HTTP backends)
//! - Rule-based fallback phrasing when generation fails
//! - The turn loop that drives one conversation
//! - TOML configuration selecting a backend per component

pub mod types;

pub mod config;
pub mod dialogue;
pub mod error;
pub mod fallback;
pub mod nlg;
pub mod nlu;
pub mod policy;
pub mod remote;

// Re-export commonly used types at crate root
pub use types::{display_acts, DialogueAct, Session, SENTINEL_VALUES};

pub use config::{ComponentConfig, DialogueConfig};
pub use dialogue::{is_exit_command, DialogueSession, LoopState, TurnOutcome, TurnTrace};
pub use error::{ConfigError, GeneratorError, PolicyError, RemoteError, UnderstandingError};
pub use fallback::{format_fallback, UNPHRASED_RESPONSE};
pub use nlg::Generator;
pub use nlu::Understanding;
pub use policy::Policy;
pub use remote::EndpointConfig;
