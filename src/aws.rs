//! AWS SDK client construction.
//!
//! Credentials come from the standard AWS credential chain:
//!
//! 1. Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
//! 2. AWS credentials file (`~/.aws/credentials`)
//! 3. IAM instance profile (when running on EC2)
//!
//! The region is always taken from the server configuration so that the
//! pre-flight checks and the deployment look at the same place.

use crate::config::ServerConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::debug;

/// Load shared SDK configuration for the configured region.
pub async fn load_sdk_config(config: &ServerConfig) -> SdkConfig {
    load_sdk_config_for(&config.region, config.endpoint_url.as_deref()).await
}

/// Load shared SDK configuration for an explicit region and optional endpoint.
pub async fn load_sdk_config_for(region: &str, endpoint_url: Option<&str>) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

    if let Some(endpoint) = endpoint_url {
        debug!("Using AWS endpoint override {}", endpoint);
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}

/// Clients for every AWS service the tool talks to, built from one
/// [`SdkConfig`].
#[derive(Clone, Debug)]
pub struct AwsClients {
    pub ssm: aws_sdk_ssm::Client,
    pub ec2: aws_sdk_ec2::Client,
    pub cloudformation: aws_sdk_cloudformation::Client,
}

impl AwsClients {
    /// Build all clients from a shared SDK configuration.
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            ssm: aws_sdk_ssm::Client::new(sdk_config),
            ec2: aws_sdk_ec2::Client::new(sdk_config),
            cloudformation: aws_sdk_cloudformation::Client::new(sdk_config),
        }
    }

    /// Load configuration for the server's region and build all clients.
    pub async fn from_config(config: &ServerConfig) -> Self {
        Self::new(&load_sdk_config(config).await)
    }
}
