//! Settings file management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::options::{DeployOptions, ServiceEndpoints};
use crate::logs::LogLevel;
use crate::models::upload::Language;

/// Settings read from an optional JSON file
///
/// Every field may be omitted; missing fields take the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Source language
    #[serde(default)]
    pub language: Language,

    /// Deployment timeout in seconds
    #[serde(default = "default_deploy_timeout")]
    pub deploy_timeout_secs: u64,

    /// Health check timeout in seconds
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Maximum deployment attempts
    #[serde(default = "default_max_deploy_attempts")]
    pub max_deploy_attempts: u32,

    /// Maximum size of a response body in bytes
    #[serde(default = "default_max_response_body_size")]
    pub max_response_body_size: usize,

    /// Service endpoints
    #[serde(default)]
    pub service: ServiceSettings,
}

fn default_deploy_timeout() -> u64 {
    90
}

fn default_health_timeout() -> u64 {
    30
}

fn default_http_timeout() -> u64 {
    30
}

fn default_max_deploy_attempts() -> u32 {
    10
}

fn default_max_response_body_size() -> usize {
    4096
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            language: Language::Auto,
            deploy_timeout_secs: default_deploy_timeout(),
            health_timeout_secs: default_health_timeout(),
            http_timeout_secs: default_http_timeout(),
            max_deploy_attempts: default_max_deploy_attempts(),
            max_response_body_size: default_max_response_body_size(),
            service: ServiceSettings::default(),
        }
    }
}

/// Deployment service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(default = "default_deploy_url")]
    pub deploy_url: String,

    #[serde(default = "default_status_url")]
    pub status_url: String,

    #[serde(default = "default_instance_domain")]
    pub instance_domain: String,

    #[serde(default = "default_instance_scheme")]
    pub instance_scheme: String,

    #[serde(default = "default_health_path")]
    pub health_path: String,
}

fn default_deploy_url() -> String {
    ServiceEndpoints::default().deploy_url
}

fn default_status_url() -> String {
    ServiceEndpoints::default().status_url
}

fn default_instance_domain() -> String {
    ServiceEndpoints::default().instance_domain
}

fn default_instance_scheme() -> String {
    ServiceEndpoints::default().instance_scheme
}

fn default_health_path() -> String {
    ServiceEndpoints::default().health_path
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            deploy_url: default_deploy_url(),
            status_url: default_status_url(),
            instance_domain: default_instance_domain(),
            instance_scheme: default_instance_scheme(),
            health_path: default_health_path(),
        }
    }
}

impl From<Settings> for DeployOptions {
    fn from(settings: Settings) -> Self {
        Self {
            language: settings.language,
            deploy_timeout: Duration::from_secs(settings.deploy_timeout_secs),
            health_timeout: Duration::from_secs(settings.health_timeout_secs),
            http_timeout: Duration::from_secs(settings.http_timeout_secs),
            max_deploy_attempts: settings.max_deploy_attempts,
            max_response_body_size: settings.max_response_body_size,
            endpoints: ServiceEndpoints {
                deploy_url: settings.service.deploy_url,
                status_url: settings.service.status_url,
                instance_domain: settings.service.instance_domain,
                instance_scheme: settings.service.instance_scheme,
                health_path: settings.service.health_path,
            },
            ..Default::default()
        }
    }
}
