//! Configuration for claude-server
//!
//! The server configuration is assembled once at startup from layered sources,
//! later layers overriding earlier ones:
//! - Built-in defaults
//! - User configuration (`~/.config/claude-server/config.toml`)
//! - Project configuration (`./claude-server.{toml,yaml,yml,json}`)
//! - Environment variables (`CLAUDE_SERVER_*`)
//!
//! An explicit `--config` path replaces the file search entirely. Values are
//! carried exactly as supplied.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

/// Default EC2 instance type (Graviton, enough for code-server plus a build)
pub const DEFAULT_INSTANCE_TYPE: &str = "t4g.small";

/// Default root volume size in GiB
pub const DEFAULT_VOLUME_SIZE: u32 = 30;

/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default name of the SSM SecureString holding the code-server password
pub const DEFAULT_SSM_PARAMETER: &str = "/claude-server/code-server-password";

/// Project-local configuration file names, in lookup order
const PROJECT_CONFIG_FILES: &[&str] = &[
    "claude-server.toml",
    "claude-server.yaml",
    "claude-server.yml",
    "claude-server.json",
];

/// Fully resolved server configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Validate)]
pub struct ServerConfig {
    /// Subdomain serving code-server (e.g. `dev.example.com`)
    #[validate(length(min = 1))]
    pub domain: String,

    /// Route 53 hosted zone ID for the domain
    #[validate(length(min = 1))]
    pub hosted_zone_id: String,

    /// Password for the code-server web interface. Only needed to seed the
    /// SSM parameter; the instance reads the password from SSM at boot.
    pub code_server_password: Option<String>,

    /// Contact address for Let's Encrypt certificate notifications
    #[validate(email)]
    pub email: String,

    /// Existing EC2 key pair used for SSH access
    #[validate(length(min = 1))]
    pub key_pair_name: String,

    /// EC2 instance type
    #[validate(length(min = 1))]
    pub instance_type: String,

    /// Root EBS volume size in GiB
    #[validate(range(min = 8, max = 16384))]
    pub volume_size: u32,

    /// AWS region to deploy into
    #[validate(length(min = 1))]
    pub region: String,

    /// Name of the SSM SecureString parameter holding the password
    #[validate(length(min = 1))]
    pub ssm_password_parameter_name: String,

    /// Override for the AWS service endpoint (local testing)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("domain", &self.domain)
            .field("hosted_zone_id", &self.hosted_zone_id)
            .field(
                "code_server_password",
                &self.code_server_password.as_ref().map(|_| "********"),
            )
            .field("email", &self.email)
            .field("key_pair_name", &self.key_pair_name)
            .field("instance_type", &self.instance_type)
            .field("volume_size", &self.volume_size)
            .field("region", &self.region)
            .field(
                "ssm_password_parameter_name",
                &self.ssm_password_parameter_name,
            )
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from the standard locations plus the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut layer = ConfigLayer::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                layer = layer.merge(ConfigLayer::from_file(&path)?);
            } else if config_path.is_some() {
                return Err(Error::ConfigRead {
                    path,
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
        }

        layer = layer.merge(ConfigLayer::from_env()?);
        Self::resolve(layer)
    }

    /// Apply defaults to a merged layer, check required fields, and validate.
    pub fn resolve(layer: ConfigLayer) -> Result<Self> {
        let config = ServerConfig {
            domain: layer.domain.ok_or(Error::MissingField("domain"))?,
            hosted_zone_id: layer
                .hosted_zone_id
                .ok_or(Error::MissingField("hosted_zone_id"))?,
            code_server_password: layer.code_server_password,
            email: layer.email.ok_or(Error::MissingField("email"))?,
            key_pair_name: layer
                .key_pair_name
                .ok_or(Error::MissingField("key_pair_name"))?,
            instance_type: layer
                .instance_type
                .unwrap_or_else(|| DEFAULT_INSTANCE_TYPE.to_string()),
            volume_size: layer.volume_size.unwrap_or(DEFAULT_VOLUME_SIZE),
            region: layer.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
            ssm_password_parameter_name: layer
                .ssm_password_parameter_name
                .unwrap_or_else(|| DEFAULT_SSM_PARAMETER.to_string()),
            endpoint_url: layer.endpoint_url,
        };

        config.validate()?;
        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&Path>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.to_path_buf()];
        }

        let mut paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("claude-server").join("config.toml"));
        }

        for name in PROJECT_CONFIG_FILES {
            paths.push(PathBuf::from(name));
        }

        paths
    }

    /// Render the configuration for display with the password redacted.
    pub fn redacted(&self) -> Self {
        Self {
            code_server_password: self
                .code_server_password
                .as_ref()
                .map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

/// One partial configuration source. Every field is optional so that layers
/// can be merged before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub domain: Option<String>,
    #[serde(alias = "hostedZoneId")]
    pub hosted_zone_id: Option<String>,
    #[serde(alias = "codeServerPassword")]
    pub code_server_password: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "keyPairName")]
    pub key_pair_name: Option<String>,
    #[serde(alias = "instanceType")]
    pub instance_type: Option<String>,
    #[serde(alias = "volumeSize")]
    pub volume_size: Option<u32>,
    pub region: Option<String>,
    #[serde(alias = "ssmPasswordParameterName")]
    pub ssm_password_parameter_name: Option<String>,
    #[serde(alias = "endpointUrl")]
    pub endpoint_url: Option<String>,
}

impl ConfigLayer {
    /// Parse a layer from a file, choosing the format by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => {
                serde_yaml::from_str(&content).map_err(|e| Error::config_parse(path, e.to_string()))
            }
            "json" => {
                serde_json::from_str(&content).map_err(|e| Error::config_parse(path, e.to_string()))
            }
            "toml" => {
                toml::from_str(&content).map_err(|e| Error::config_parse(path, e.to_string()))
            }
            _ => toml::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .map_err(|e| Error::config_parse(path, e.to_string())),
        }
    }

    /// Read the `CLAUDE_SERVER_*` environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a layer from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let volume_size = match lookup("CLAUDE_SERVER_VOLUME_SIZE") {
            Some(raw) => Some(raw.parse::<u32>().map_err(|e| Error::InvalidEnv {
                var: "CLAUDE_SERVER_VOLUME_SIZE",
                message: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            domain: lookup("CLAUDE_SERVER_DOMAIN"),
            hosted_zone_id: lookup("CLAUDE_SERVER_HOSTED_ZONE_ID"),
            code_server_password: lookup("CLAUDE_SERVER_PASSWORD"),
            email: lookup("CLAUDE_SERVER_EMAIL"),
            key_pair_name: lookup("CLAUDE_SERVER_KEY_PAIR_NAME"),
            instance_type: lookup("CLAUDE_SERVER_INSTANCE_TYPE"),
            volume_size,
            region: lookup("CLAUDE_SERVER_REGION"),
            ssm_password_parameter_name: lookup("CLAUDE_SERVER_SSM_PARAMETER"),
            endpoint_url: lookup("CLAUDE_SERVER_ENDPOINT_URL"),
        })
    }

    /// Merge another layer into this one; set fields in `other` win.
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            domain: other.domain.or(self.domain),
            hosted_zone_id: other.hosted_zone_id.or(self.hosted_zone_id),
            code_server_password: other.code_server_password.or(self.code_server_password),
            email: other.email.or(self.email),
            key_pair_name: other.key_pair_name.or(self.key_pair_name),
            instance_type: other.instance_type.or(self.instance_type),
            volume_size: other.volume_size.or(self.volume_size),
            region: other.region.or(self.region),
            ssm_password_parameter_name: other
                .ssm_password_parameter_name
                .or(self.ssm_password_parameter_name),
            endpoint_url: other.endpoint_url.or(self.endpoint_url),
        }
    }
}
