//! Pre-flight checks run before a stack is synthesized or deployed.
//!
//! The password parameter must already exist in SSM Parameter Store because
//! the instance reads it at boot. A missing parameter is reported as
//! [`Error::ParameterNotFound`] so the CLI can print remediation steps and
//! exit with status 1. Every other failure (permissions, throttling, network)
//! is returned unchanged.

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_sdk_ssm::types::ParameterType;
use tracing::{debug, info};

/// Outcome of a lookup against a managed store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The item exists
    Found,
    /// The store reported the item as missing
    NotFound,
}

/// Read/write access to a parameter store holding the deployment secret.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Look up a parameter by name without decrypting it.
    async fn lookup(&self, name: &str) -> Result<Lookup>;

    /// Store a SecureString parameter.
    async fn put_secure(&self, name: &str, value: &str, overwrite: bool) -> Result<()>;
}

/// Existence checks for EC2 key pairs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyPairStore: Send + Sync {
    /// Look up a key pair by name.
    async fn lookup_key_pair(&self, name: &str) -> Result<Lookup>;
}

/// [`ParameterStore`] backed by AWS Systems Manager.
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn lookup(&self, name: &str) -> Result<Lookup> {
        let result = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(false)
            .send()
            .await;

        match result {
            Ok(_) => Ok(Lookup::Found),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_parameter_not_found()) =>
            {
                Ok(Lookup::NotFound)
            }
            Err(err) => Err(Error::aws("GetParameter", err)),
        }
    }

    async fn put_secure(&self, name: &str, value: &str, overwrite: bool) -> Result<()> {
        let result = self
            .client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(ParameterType::SecureString)
            .overwrite(overwrite)
            .description("code-server password for claude-server")
            .send()
            .await;

        match result {
            Ok(output) => {
                debug!("Stored {} at version {:?}", name, output.version());
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_parameter_already_exists()) =>
            {
                Err(Error::ParameterExists(name.to_string()))
            }
            Err(err) => Err(Error::aws("PutParameter", err)),
        }
    }
}

/// EC2 error code for a key pair that does not exist.
const KEY_PAIR_NOT_FOUND: &str = "InvalidKeyPair.NotFound";

/// [`KeyPairStore`] backed by the EC2 API.
pub struct Ec2KeyPairStore {
    client: aws_sdk_ec2::Client,
}

impl Ec2KeyPairStore {
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeyPairStore for Ec2KeyPairStore {
    async fn lookup_key_pair(&self, name: &str) -> Result<Lookup> {
        use aws_sdk_ec2::error::ProvideErrorMetadata;

        match self.client.describe_key_pairs().key_names(name).send().await {
            Ok(output) if output.key_pairs().is_empty() => Ok(Lookup::NotFound),
            Ok(_) => Ok(Lookup::Found),
            Err(err) if err.code() == Some(KEY_PAIR_NOT_FOUND) => Ok(Lookup::NotFound),
            Err(err) => Err(Error::aws("DescribeKeyPairs", err)),
        }
    }
}

/// Fail with [`Error::ParameterNotFound`] unless the parameter exists.
pub async fn ensure_parameter_exists(
    store: &dyn ParameterStore,
    name: &str,
    region: &str,
) -> Result<()> {
    debug!("Checking SSM parameter {} in {}", name, region);

    match store.lookup(name).await? {
        Lookup::Found => {
            info!("SSM parameter {} found", name);
            Ok(())
        }
        Lookup::NotFound => Err(Error::ParameterNotFound {
            name: name.to_string(),
            region: region.to_string(),
        }),
    }
}

/// Fail with [`Error::KeyPairNotFound`] unless the key pair exists.
pub async fn ensure_key_pair_exists(
    store: &dyn KeyPairStore,
    name: &str,
    region: &str,
) -> Result<()> {
    debug!("Checking EC2 key pair {} in {}", name, region);

    match store.lookup_key_pair(name).await? {
        Lookup::Found => {
            info!("EC2 key pair {} found", name);
            Ok(())
        }
        Lookup::NotFound => Err(Error::KeyPairNotFound {
            name: name.to_string(),
            region: region.to_string(),
        }),
    }
}

/// The full set of checks for a configuration.
pub struct Preflight<'a> {
    config: &'a ServerConfig,
    parameters: &'a dyn ParameterStore,
    key_pairs: Option<&'a dyn KeyPairStore>,
}

impl<'a> Preflight<'a> {
    pub fn new(config: &'a ServerConfig, parameters: &'a dyn ParameterStore) -> Self {
        Self {
            config,
            parameters,
            key_pairs: None,
        }
    }

    /// Also verify the configured key pair.
    pub fn with_key_pairs(mut self, key_pairs: &'a dyn KeyPairStore) -> Self {
        self.key_pairs = Some(key_pairs);
        self
    }

    /// Run the checks in order, stopping at the first failure.
    pub async fn run(&self) -> Result<()> {
        ensure_parameter_exists(
            self.parameters,
            &self.config.ssm_password_parameter_name,
            &self.config.region,
        )
        .await?;

        if let Some(key_pairs) = self.key_pairs {
            ensure_key_pair_exists(key_pairs, &self.config.key_pair_name, &self.config.region)
                .await?;
        }

        Ok(())
    }
}

/// Remediation steps for a failed pre-flight check, if the error is one.
pub fn remediation(err: &Error) -> Option<String> {
    match err {
        Error::ParameterNotFound { name, region } => Some(format!(
            "The SSM parameter '{name}' was not found in region {region}.\n\
             \n\
             Create it before deploying:\n\
             \n\
             \x20 aws ssm put-parameter \\\n\
             \x20   --name \"{name}\" \\\n\
             \x20   --type SecureString \\\n\
             \x20   --value \"<your-code-server-password>\" \\\n\
             \x20   --region {region}\n\
             \n\
             or store the password from your configuration with:\n\
             \n\
             \x20 claude-server store-password"
        )),
        Error::KeyPairNotFound { name, region } => Some(format!(
            "The EC2 key pair '{name}' was not found in region {region}.\n\
             \n\
             Create or import it before deploying:\n\
             \n\
             \x20 aws ec2 create-key-pair \\\n\
             \x20   --key-name \"{name}\" \\\n\
             \x20   --query KeyMaterial --output text \\\n\
             \x20   --region {region} > {name}.pem"
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLayer;
    use mockall::predicate::function;

    fn config() -> ServerConfig {
        ServerConfig::resolve(ConfigLayer {
            domain: Some("dev.example.com".into()),
            hosted_zone_id: Some("Z0123456789ABC".into()),
            email: Some("ops@example.com".into()),
            key_pair_name: Some("laptop".into()),
            ..ConfigLayer::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_existing_parameter_passes() {
        let mut store = MockParameterStore::new();
        store
            .expect_lookup()
            .with(function(|name: &str| name == "/claude-server/code-server-password"))
            .times(1)
            .returning(|_| Ok(Lookup::Found));

        ensure_parameter_exists(&store, "/claude-server/code-server-password", "us-east-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_parameter_is_not_found() {
        let mut store = MockParameterStore::new();
        store.expect_lookup().returning(|_| Ok(Lookup::NotFound));

        let err = ensure_parameter_exists(&store, "/missing", "eu-central-1")
            .await
            .unwrap_err();
        match &err {
            Error::ParameterNotFound { name, region } => {
                assert_eq!(name, "/missing");
                assert_eq!(region, "eu-central-1");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let text = remediation(&err).unwrap();
        assert!(text.contains("/missing"));
        assert!(text.contains("eu-central-1"));
        assert!(text.contains("SecureString"));
    }

    #[tokio::test]
    async fn test_other_failures_propagate() {
        let mut store = MockParameterStore::new();
        store.expect_lookup().returning(|_| {
            Err(Error::Aws {
                operation: "GetParameter",
                code: Some("AccessDeniedException".into()),
                message: "User is not authorized".into(),
                source: None,
            })
        });

        let err = ensure_parameter_exists(&store, "/p", "us-east-1")
            .await
            .unwrap_err();
        assert_eq!(err.aws_code(), Some("AccessDeniedException"));
        assert!(remediation(&err).is_none());
    }

    #[tokio::test]
    async fn test_preflight_checks_key_pair_after_parameter() {
        let config = config();
        let mut params = MockParameterStore::new();
        params.expect_lookup().returning(|_| Ok(Lookup::Found));
        let mut keys = MockKeyPairStore::new();
        keys.expect_lookup_key_pair()
            .with(function(|name: &str| name == "laptop"))
            .returning(|_| Ok(Lookup::NotFound));

        let err = Preflight::new(&config, &params)
            .with_key_pairs(&keys)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::KeyPairNotFound { .. }));
        assert!(remediation(&err).unwrap().contains("create-key-pair"));
    }

    #[tokio::test]
    async fn test_preflight_stops_at_missing_parameter() {
        let config = config();
        let mut params = MockParameterStore::new();
        params.expect_lookup().returning(|_| Ok(Lookup::NotFound));
        let mut keys = MockKeyPairStore::new();
        keys.expect_lookup_key_pair().never();

        let err = Preflight::new(&config, &params)
            .with_key_pairs(&keys)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParameterNotFound { .. }));
    }
}
