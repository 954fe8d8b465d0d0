use crate::backend::{
    BackendKind, DEFAULT_CHAT_URL, DEFAULT_HOSTED_URL, DEFAULT_POSITIVE_LABEL, DEFAULT_THRESHOLD,
};
use crate::request::EndpointKind;
use crate::retry::{DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: EndpointKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    LocalClassifier(ClassifierConfig),
    LocalEmbedding(ModelServerConfig),
    LocalRanking(ModelServerConfig),
    HostedInference(HostedConfig),
    ChatCompletion(ChatConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_model_server_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_positive_label")]
    pub positive_label: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelServerConfig {
    #[serde(default = "default_model_server_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedConfig {
    #[serde(default = "default_hosted_url")]
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_url")]
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.delay_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::LocalClassifier(_) => BackendKind::LocalClassifier,
            Self::LocalEmbedding(_) => BackendKind::LocalEmbedding,
            Self::LocalRanking(_) => BackendKind::LocalRanking,
            Self::HostedInference(_) => BackendKind::HostedInference,
            Self::ChatCompletion(_) => BackendKind::ChatCompletion,
        }
    }

    pub fn set_model(&mut self, model: String) {
        match self {
            Self::LocalClassifier(c) => c.model = model,
            Self::LocalEmbedding(c) | Self::LocalRanking(c) => c.model = model,
            Self::HostedInference(c) => c.model = model,
            Self::ChatCompletion(c) => c.model = model,
        }
    }

    /// Only remote collaborators take a bearer token; returns whether it was applied.
    pub fn set_api_token(&mut self, token: String) -> bool {
        match self {
            Self::HostedInference(c) => c.api_token = Some(token),
            Self::ChatCompletion(c) => c.api_token = Some(token),
            _ => return false,
        }
        true
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            service: ServiceConfig::default(),
            retry: RetryConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
            backend: BackendConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::LocalClassifier(ClassifierConfig {
            base_url: default_model_server_url(),
            model: String::new(),
            positive_label: default_positive_label(),
            threshold: default_threshold(),
        })
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_endpoint() -> EndpointKind {
    EndpointKind::Detect
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY.as_millis() as u64
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_model_server_url() -> String {
    "http://127.0.0.1:8081".to_string()
}

fn default_positive_label() -> String {
    DEFAULT_POSITIVE_LABEL.to_string()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_hosted_url() -> String {
    DEFAULT_HOSTED_URL.to_string()
}

fn default_chat_url() -> String {
    DEFAULT_CHAT_URL.to_string()
}
