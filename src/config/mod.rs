mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Bearer token for whichever remote collaborator the backend talks to.
pub const API_TOKEN_VAR: &str = "INFERENCE_API_TOKEN";
pub const MODEL_VAR: &str = "INFERENCE_MODEL";
pub const RETRY_MAX_ATTEMPTS_VAR: &str = "RETRY_MAX_ATTEMPTS";
pub const RETRY_DELAY_MS_VAR: &str = "RETRY_DELAY_MS";
pub const PORT_VAR: &str = "PORT";

/// Loads the process configuration once at startup.
///
/// `CONFIG_PATH` must point at an existing file when set. Otherwise
/// `config.yaml` is used if present, and built-in defaults if not.
/// Environment overrides are applied last, then the result is validated.
pub async fn load() -> Result<Config> {
    let mut config = match env::var("CONFIG_PATH") {
        Ok(path) => read(&path).await?,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => read(DEFAULT_CONFIG_PATH).await?,
        Err(_) => {
            debug!("No configuration file found, using defaults");
            Config::default()
        }
    };

    config.apply_overrides(|key| env::var(key).ok())?;
    config.validate()?;

    Ok(config)
}

/// Loads and validates a configuration file without environment overrides.
pub async fn load_from(path: impl AsRef<Path>) -> Result<Config> {
    let config = read(path).await?;
    config.validate()?;
    Ok(config)
}

async fn read(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    debug!("Loading configuration from: {}", path.display());

    let config_str = tokio::fs::read_to_string(path).await?;
    Config::from_yaml(&config_str)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(API_TOKEN_VAR).filter(|t| !t.is_empty()) {
            if !self.backend.set_api_token(token) {
                warn!(
                    "{} is set but the {:?} backend does not use a token",
                    API_TOKEN_VAR,
                    self.backend.kind()
                );
            }
        }
        if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.is_empty()) {
            self.backend.set_model(model);
        }
        if let Some(value) = lookup(RETRY_MAX_ATTEMPTS_VAR) {
            self.retry.max_attempts = parse_var(RETRY_MAX_ATTEMPTS_VAR, &value)?;
        }
        if let Some(value) = lookup(RETRY_DELAY_MS_VAR) {
            self.retry.delay_ms = parse_var(RETRY_DELAY_MS_VAR, &value)?;
        }
        if let Some(value) = lookup(PORT_VAR) {
            self.server.port = parse_var(PORT_VAR, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::config("retry.max_attempts must be at least 1"));
        }

        if let BackendConfig::LocalClassifier(c) = &self.backend {
            if !(0.0..=1.0).contains(&c.threshold) {
                return Err(Error::config(format!(
                    "backend.threshold must be within [0, 1], got {}",
                    c.threshold
                )));
            }
        }

        let kind = self.backend.kind();
        if !kind.supports(self.service.endpoint) {
            return Err(Error::config(format!(
                "{:?} backend cannot serve the '{}' endpoint",
                kind, self.service.endpoint
            )));
        }

        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("Invalid value for {}: '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use crate::request::EndpointKind;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.service.endpoint, EndpointKind::Detect);
        assert_eq!(config.backend.kind(), BackendKind::LocalClassifier);
        assert_eq!(config.retry_policy().max_attempts(), 3);
        assert_eq!(config.retry_policy().delay(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_detect_config() {
        let yaml = r#"
server:
  port: 5001
service:
  endpoint: detect
retry:
  max_attempts: 5
  delay_ms: 250
backend:
  kind: local_classifier
  base_url: http://model:80
  model: roberta-base-openai-detector
  threshold: 0.7
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.retry_policy().max_attempts(), 5);
        assert_eq!(config.retry_policy().delay(), Duration::from_millis(250));

        let BackendConfig::LocalClassifier(c) = &config.backend else {
            panic!("expected a classifier backend");
        };
        assert_eq!(c.threshold, 0.7);
        assert_eq!(c.positive_label, "LABEL_1");
        assert_eq!(c.model, "roberta-base-openai-detector");
    }

    #[test]
    fn test_parse_hosted_config() {
        let yaml = r#"
service:
  endpoint: hosted_similarity
backend:
  kind: hosted_inference
  model: sentence-transformers/all-MiniLM-L6-v2
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let BackendConfig::HostedInference(c) = &config.backend else {
            panic!("expected a hosted backend");
        };
        assert_eq!(c.base_url, "https://api-inference.huggingface.co");
        assert!(c.api_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_backend_kind_is_rejected() {
        let yaml = "backend:\n  kind: quantum\n";
        assert!(matches!(Config::from_yaml(yaml), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_token_override_applies_to_remote_backends() {
        let yaml = "service:\n  endpoint: chat\nbackend:\n  kind: chat_completion\n  model: gpt-4o-mini\n";
        let mut config = Config::from_yaml(yaml).unwrap();
        config
            .apply_overrides(env_of(&[(API_TOKEN_VAR, "sk-env"), (MODEL_VAR, "gpt-4o")]))
            .unwrap();

        let BackendConfig::ChatCompletion(c) = &config.backend else {
            panic!("expected a chat backend");
        };
        assert_eq!(c.api_token.as_deref(), Some("sk-env"));
        assert_eq!(c.model, "gpt-4o");
    }

    #[test]
    fn test_token_override_ignored_for_local_backends() {
        let mut config = Config::default();
        config
            .apply_overrides(env_of(&[(API_TOKEN_VAR, "hf_x")]))
            .unwrap();
        assert_eq!(config.backend.kind(), BackendKind::LocalClassifier);
    }

    #[test]
    fn test_retry_and_port_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env_of(&[
                (RETRY_MAX_ATTEMPTS_VAR, "4"),
                (RETRY_DELAY_MS_VAR, "20"),
                (PORT_VAR, "9000"),
            ]))
            .unwrap();
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.delay_ms, 20);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env_of(&[(RETRY_MAX_ATTEMPTS_VAR, "three")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid value for RETRY_MAX_ATTEMPTS: 'three'"
        );
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let yaml = "backend:\n  kind: local_classifier\n  threshold: 1.5\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_incompatible_endpoint() {
        let yaml = "service:\n  endpoint: rank\nbackend:\n  kind: local_classifier\n";
        let config = Config::from_yaml(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cannot serve the 'rank' endpoint"));
    }
}
