//! Error types for each component boundary

use thiserror::Error;

/// Failures talking to a component served over HTTP
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} - {body}")]
    Status { status: u16, body: String },
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("path {path} not found in response: {reason}")]
    Path { path: String, reason: String },
    #[error("missing environment variable: {0}")]
    MissingEnv(String),
}

#[derive(Debug, Error)]
pub enum UnderstandingError {
    #[error("empty utterance")]
    EmptyUtterance,
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("session state is corrupt: {0}")]
    CorruptSession(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("no template for {0}")]
    NoTemplate(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Configuration loading and component construction errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
