//! Deployment service API client

use async_trait::async_trait;
use url::Url;

use crate::deploy::remote::RemoteService;
use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::models::instance::{Instance, StatusSnapshot};
use crate::models::upload::{Language, UploadRequest, UploadResponse};

impl HttpClient {
    /// Status URL of an instance: the status endpoint plus the escaped id
    pub fn status_url(&self, instance: &Instance) -> Result<Url, DeployError> {
        let mut url = Url::parse(&self.endpoints().status_url)?;
        url.path_segments_mut()
            .map_err(|_| DeployError::Config("status url cannot take a path".to_string()))?
            .pop_if_empty()
            .push(instance.id());
        Ok(url)
    }
}

#[async_trait]
impl RemoteService for HttpClient {
    async fn submit(&self, request: &UploadRequest) -> Result<Instance, DeployError> {
        if request.lang == Language::Auto {
            return Err(DeployError::Internal(
                "language must be resolved before upload".to_string(),
            ));
        }

        let url = Url::parse(&self.endpoints().deploy_url)?;
        let response: UploadResponse = self.post(url, request).await?;

        if !response.success {
            return Err(DeployError::Service(response.message));
        }
        if response.id.is_empty() {
            return Err(DeployError::Protocol(
                "upload response carries no instance id".to_string(),
            ));
        }
        Ok(Instance::new(response.id))
    }

    async fn poll_status(&self, instance: &Instance) -> Result<StatusSnapshot, DeployError> {
        let url = self.status_url(instance)?;
        self.get(url).await
    }

    async fn probe_health(&self, instance: &Instance) -> Result<bool, DeployError> {
        let url = instance.health_url(self.endpoints())?;
        self.probe(url).await
    }
}
