//! Instance models

use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::options::ServiceEndpoints;
use crate::errors::DeployError;

/// A deployed instance, identified by the id the service assigned on upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    id: String,
}

impl Instance {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Get the instance id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Public address of the instance: `<scheme>://<id>.<instance_domain>/`
    pub fn url(&self, endpoints: &ServiceEndpoints) -> Result<Url, DeployError> {
        let raw = format!(
            "{}://{}.{}/",
            endpoints.instance_scheme, self.id, endpoints.instance_domain
        );
        let url = Url::parse(&raw).map_err(|e| {
            DeployError::Protocol(format!("instance id [{}] is not a valid host label: {}", self.id, e))
        })?;

        // The id must stay a label under the instance domain
        let expected = format!("{}.{}", self.id, endpoints.instance_domain);
        let contained = url
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(&expected))
            && url.username().is_empty()
            && url.password().is_none()
            && url.path() == "/"
            && url.query().is_none()
            && url.fragment().is_none();
        if !contained {
            return Err(DeployError::Protocol(format!(
                "instance id [{}] does not name a host under {}",
                self.id, endpoints.instance_domain
            )));
        }
        Ok(url)
    }

    /// Address of the health check endpoint
    pub fn health_url(&self, endpoints: &ServiceEndpoints) -> Result<Url, DeployError> {
        let url = self.url(endpoints)?;
        Ok(url.join(&endpoints.health_path)?)
    }
}

/// One status poll result
///
/// Snapshots are compared field by field to detect a change. The default
/// value is the "nothing observed yet" snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub done: bool,
}
