//! Main deployment run

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::app::options::DeployOptions;
use crate::deploy::clock::SystemClock;
use crate::deploy::orchestrator::{DeployPolicy, Deployer};
use crate::deploy::package::SourcePackager;
use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::utils::{user_agent, version_info};

impl From<&DeployOptions> for DeployPolicy {
    fn from(options: &DeployOptions) -> Self {
        Self {
            max_attempts: options.max_deploy_attempts,
            deploy_timeout: options.deploy_timeout,
            health_timeout: options.health_timeout,
            poll_interval: options.poll_interval,
        }
    }
}

/// Deploy the directory at `source` and return the address of the instance
pub async fn run(
    source: PathBuf,
    options: DeployOptions,
    cancel: CancellationToken,
) -> Result<Url, DeployError> {
    options.validate()?;

    let version = version_info();
    debug!(
        user_agent = %user_agent(),
        git_hash = %version.git_hash,
        build_time = %version.build_time,
        "Starting terrctl"
    );
    info!("Deploying with options: {:?}", options);

    let client = Arc::new(HttpClient::new(&options)?);
    let packager = SourcePackager::new(source, options.language);
    let deployer = Deployer::new(client, Arc::new(SystemClock), DeployPolicy::from(&options));

    let instance = deployer.deploy(&packager, &cancel).await?;
    instance.url(&options.endpoints)
}
