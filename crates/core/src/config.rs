//! Component Configuration
//!
//! Selects a backend per component from a TOML file:
//!
//! ```toml
//! [nlu]
//! backend = "http"
//! url = "http://localhost:8000/nlu"
//! headers = { Authorization = "Bearer ${CONVLAB_API_KEY}" }
//!
//! [policy]
//! backend = "stub"
//! ```
//!
//! Missing sections default to the stub backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::nlg::{Generator, HttpNlg, TemplateNlg};
use crate::nlu::{HttpNlu, KeywordNlu, Understanding};
use crate::policy::{HttpPolicy, Policy, RulePolicy};
use crate::remote::EndpointConfig;

const APP_DIR: &str = "dialogue-loop";
const CONFIG_FILE: &str = "config.toml";

/// Backend for one component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum ComponentConfig {
    /// Local deterministic stand-in
    #[default]
    Stub,
    /// External service reached over HTTP
    Http(EndpointConfig),
}

impl fmt::Display for ComponentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentConfig::Stub => write!(f, "stub"),
            ComponentConfig::Http(endpoint) => write!(f, "http {}", endpoint.url),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueConfig {
    #[serde(default)]
    pub nlu: ComponentConfig,

    #[serde(default)]
    pub policy: ComponentConfig,

    #[serde(default)]
    pub nlg: ComponentConfig,
}

impl DialogueConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: DialogueConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/dialogue-loop/config.toml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load `explicit` if given, else the default file if it exists, else stubs
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            tracing::info!(path = %path.display(), "loading config");
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "loading default config");
                Self::load(&path)
            }
            _ => {
                tracing::info!("no config file found, using stub components");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, component) in [("nlu", &self.nlu), ("policy", &self.policy), ("nlg", &self.nlg)] {
            if let ComponentConfig::Http(endpoint) = component {
                endpoint.validate().map_err(|e| match e {
                    ConfigError::Invalid(msg) => ConfigError::Invalid(format!("[{}] {}", name, msg)),
                    other => other,
                })?;
            }
        }
        Ok(())
    }

    /// Switch every component to its stub backend
    pub fn use_stubs(&mut self) {
        self.nlu = ComponentConfig::Stub;
        self.policy = ComponentConfig::Stub;
        self.nlg = ComponentConfig::Stub;
    }

    pub fn build_understanding(&self) -> Result<Box<dyn Understanding>, ConfigError> {
        let nlu: Box<dyn Understanding> = match &self.nlu {
            ComponentConfig::Stub => Box::new(KeywordNlu::new()),
            ComponentConfig::Http(endpoint) => Box::new(HttpNlu::new(endpoint.clone())?),
        };
        Ok(nlu)
    }

    pub fn build_policy(&self) -> Result<Box<dyn Policy>, ConfigError> {
        let policy: Box<dyn Policy> = match &self.policy {
            ComponentConfig::Stub => Box::new(RulePolicy::new()),
            ComponentConfig::Http(endpoint) => Box::new(HttpPolicy::new(endpoint.clone())?),
        };
        Ok(policy)
    }

    pub fn build_generator(&self) -> Result<Box<dyn Generator>, ConfigError> {
        let nlg: Box<dyn Generator> = match &self.nlg {
            ComponentConfig::Stub => Box::new(TemplateNlg::new()),
            ComponentConfig::Http(endpoint) => Box::new(HttpNlg::new(endpoint.clone())?),
        };
        Ok(nlg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [nlu]
            backend = "http"
            url = "http://localhost:8000/nlu"
            timeout_secs = 5
            headers = { Authorization = "Bearer ${CONVLAB_API_KEY}" }

            [nlg]
            backend = "http"
            url = "http://localhost:8000/nlg"
            response_path = "$.result.text"
        "#;

        let config: DialogueConfig = toml::from_str(toml).unwrap();
        match &config.nlu {
            ComponentConfig::Http(endpoint) => {
                assert_eq!(endpoint.url, "http://localhost:8000/nlu");
                assert_eq!(endpoint.timeout_secs, 5);
                assert_eq!(endpoint.headers["Authorization"], "Bearer ${CONVLAB_API_KEY}");
            }
            other => panic!("Expected http backend, got {:?}", other),
        }
        assert_eq!(config.policy, ComponentConfig::Stub);
        match &config.nlg {
            ComponentConfig::Http(endpoint) => {
                assert_eq!(endpoint.timeout_secs, 30);
                assert_eq!(endpoint.response_path.as_deref(), Some("$.result.text"));
            }
            other => panic!("Expected http backend, got {:?}", other),
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_is_all_stubs() {
        let config: DialogueConfig = toml::from_str("").unwrap();
        assert_eq!(config, DialogueConfig::default());
        assert_eq!(config.nlu.to_string(), "stub");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result: Result<DialogueConfig, _> = toml::from_str("[nlu]\nbackend = \"grpc\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_names_component() {
        let mut config = DialogueConfig::default();
        config.policy = ComponentConfig::Http(EndpointConfig::new("ftp://example.com"));
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config: [policy] endpoint url must start with http:// or https://: ftp://example.com"
        );
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("dialogue_loop_test_config.toml");
        fs::write(
            &path,
            "[policy]\nbackend = \"http\"\nurl = \"https://example.com/policy\"\n",
        )
        .unwrap();

        let config = DialogueConfig::load(&path).unwrap();
        assert_eq!(config.policy.to_string(), "http https://example.com/policy");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_invalid_file() {
        let path = std::env::temp_dir().join("dialogue_loop_test_invalid.toml");
        fs::write(&path, "[nlg]\nbackend = \"http\"\nurl = \"\"\n").unwrap();

        assert!(matches!(DialogueConfig::load(&path), Err(ConfigError::Invalid(_))));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let path = Path::new("/nonexistent/dialogue-loop/config.toml");
        assert!(matches!(
            DialogueConfig::load_or_default(Some(path)),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_use_stubs_and_build() {
        let mut config = DialogueConfig {
            nlu: ComponentConfig::Http(EndpointConfig::new("http://localhost:8000/nlu")),
            ..Default::default()
        };
        config.use_stubs();
        assert_eq!(config, DialogueConfig::default());

        let nlu = config.build_understanding().unwrap();
        assert!(!nlu.predict("a cheap hotel").unwrap().is_empty());
        assert!(config.build_policy().is_ok());
        assert!(config.build_generator().is_ok());
    }
}
