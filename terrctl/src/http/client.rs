//! HTTP client implementation

use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use crate::app::options::{DeployOptions, ServiceEndpoints};
use crate::errors::DeployError;
use crate::utils::user_agent;

/// HTTP client for the deployment service and its instances
///
/// Every request carries the terrctl `User-Agent` and every body read is
/// capped at `max_body_size` bytes.
pub struct HttpClient {
    client: Client,
    endpoints: ServiceEndpoints,
    max_body_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(options: &DeployOptions) -> Result<Self, DeployError> {
        let client = Client::builder()
            .timeout(options.http_timeout)
            .user_agent(user_agent())
            .build()?;

        Ok(Self {
            client,
            endpoints: options.endpoints.clone(),
            max_body_size: options.max_response_body_size,
        })
    }

    /// Get the service endpoints
    pub fn endpoints(&self) -> &ServiceEndpoints {
        &self.endpoints
    }

    /// Make a GET request and decode the JSON answer
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, DeployError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        self.decode(response).await
    }

    /// Make a POST request with a JSON body and decode the JSON answer
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, DeployError> {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        self.decode(response).await
    }

    /// Make a GET request and report whether it answered 200 with a body
    ///
    /// Timeouts are errors; every other failure is an unhealthy answer.
    pub async fn probe(&self, url: Url) -> Result<bool, DeployError> {
        debug!("GET {} (health)", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(DeployError::Transport(e.to_string())),
            Err(e) => {
                debug!("Health check request failed: {}", e);
                return Ok(false);
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            debug!("Unexpected response from health check endpoint: {}", response.status());
            return Ok(false);
        }

        match self.read_body(response).await {
            Ok(body) if !body.is_empty() => Ok(true),
            Ok(_) => {
                debug!("Empty response from health check endpoint");
                Ok(false)
            }
            Err(e) if e.is_timeout() => Err(DeployError::Transport(e.to_string())),
            Err(e) => {
                debug!("Health check body could not be read: {}", e);
                Ok(false)
            }
        }
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, DeployError> {
        let status = response.status();
        let body = self.read_body(response).await?;
        serde_json::from_slice(&body).map_err(|e| {
            DeployError::Protocol(format!("undecodable response ({}): {}", status, e))
        })
    }

    /// Read a response body, keeping at most `max_body_size` bytes
    async fn read_body(&self, mut response: Response) -> Result<Vec<u8>, reqwest::Error> {
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let room = self.max_body_size - body.len();
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                debug!(limit = self.max_body_size, "Response body truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}
