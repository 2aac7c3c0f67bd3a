//! Deployment configuration options

use std::time::Duration;

use url::Url;

use crate::errors::DeployError;
use crate::models::upload::Language;

/// Options for one deployment run
///
/// Built once at start-up and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Requested source language (`Auto` to guess from file extensions)
    pub language: Language,

    /// Bound on the whole deployment wait
    pub deploy_timeout: Duration,

    /// Bound on the whole health wait
    pub health_timeout: Duration,

    /// Bound on a single HTTP request
    pub http_timeout: Duration,

    /// Maximum number of submit/deploy/health attempts
    pub max_deploy_attempts: u32,

    /// Maximum number of bytes read from any response body
    pub max_response_body_size: usize,

    /// Delay between two polls
    pub poll_interval: Duration,

    /// Service endpoints
    pub endpoints: ServiceEndpoints,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            language: Language::Auto,
            deploy_timeout: Duration::from_secs(90),
            health_timeout: Duration::from_secs(30),
            http_timeout: Duration::from_secs(30),
            max_deploy_attempts: 10,
            max_response_body_size: 4096,
            poll_interval: Duration::from_secs(1),
            endpoints: ServiceEndpoints::default(),
        }
    }
}

impl DeployOptions {
    /// Check the options before anything is sent
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.max_deploy_attempts == 0 {
            return Err(DeployError::Config(
                "max deploy attempts must be at least 1".to_string(),
            ));
        }
        if self.max_response_body_size == 0 {
            return Err(DeployError::Config(
                "max response body size must be greater than 0".to_string(),
            ));
        }
        self.endpoints.validate()
    }
}

/// Where the deployment service and its instances live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    /// Upload endpoint
    pub deploy_url: String,

    /// Status endpoint, the instance id is appended as a path segment
    pub status_url: String,

    /// Base domain instances are served under
    pub instance_domain: String,

    /// Scheme of instance addresses
    pub instance_scheme: String,

    /// Health check path on an instance
    pub health_path: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            deploy_url: "https://api.terrarium.run/upload".to_string(),
            status_url: "https://api.terrarium.run/status".to_string(),
            instance_domain: "terrarium.run".to_string(),
            instance_scheme: "https".to_string(),
            health_path: "/.well-known/health".to_string(),
        }
    }
}

impl ServiceEndpoints {
    fn validate(&self) -> Result<(), DeployError> {
        Url::parse(&self.deploy_url)
            .map_err(|e| DeployError::Config(format!("deploy url [{}]: {}", self.deploy_url, e)))?;
        Url::parse(&self.status_url)
            .map_err(|e| DeployError::Config(format!("status url [{}]: {}", self.status_url, e)))?;
        if self.instance_domain.is_empty() {
            return Err(DeployError::Config("instance domain is empty".to_string()));
        }
        if !matches!(self.instance_scheme.as_str(), "http" | "https") {
            return Err(DeployError::Config(format!(
                "unsupported instance scheme: {}",
                self.instance_scheme
            )));
        }
        Ok(())
    }
}
