//! Error types for claude-server.
//!
//! A single error enum covers configuration loading, the pre-flight checks
//! against AWS, stack synthesis, and deployment.

use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for claude-server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for claude-server.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Error reading a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        /// Path to the configuration file
        path: PathBuf,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a configuration file.
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParse {
        /// Path to the configuration file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// A required configuration field was not supplied by any source.
    #[error("Missing required configuration field '{0}'")]
    MissingField(&'static str),

    /// An environment override could not be interpreted.
    #[error("Invalid value for environment variable '{var}': {message}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Error message
        message: String,
    },

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    ConfigValidation(#[from] validator::ValidationErrors),

    // ========================================================================
    // Pre-flight Errors
    // ========================================================================
    /// The SSM password parameter does not exist.
    #[error("SSM parameter '{name}' not found in region '{region}'")]
    ParameterNotFound {
        /// Parameter name
        name: String,
        /// AWS region
        region: String,
    },

    /// The configured EC2 key pair does not exist.
    #[error("EC2 key pair '{name}' not found in region '{region}'")]
    KeyPairNotFound {
        /// Key pair name
        name: String,
        /// AWS region
        region: String,
    },

    /// The SSM parameter already exists and overwriting was not requested.
    #[error("SSM parameter '{0}' already exists (use --overwrite to replace it)")]
    ParameterExists(String),

    // ========================================================================
    // AWS Errors
    // ========================================================================
    /// An AWS API call failed.
    #[error("AWS {operation} failed: {message}")]
    Aws {
        /// API operation name
        operation: &'static str,
        /// Error code reported by the service, if any
        code: Option<String>,
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ========================================================================
    // Stack Errors
    // ========================================================================
    /// A value could not be safely interpolated into the bootstrap script.
    #[error("Unsafe value for '{field}': {message}")]
    UnsafeValue {
        /// Configuration field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// Template error.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Stack deployment ended in a failed state.
    #[error("Stack '{stack}' ended in {status}: {reason}")]
    DeployFailed {
        /// Stack name
        stack: String,
        /// Terminal stack status
        status: String,
        /// Status reason reported by CloudFormation
        reason: String,
    },

    /// Waiting on a stack operation timed out.
    #[error("Timed out after {timeout_secs} seconds waiting for stack '{stack}'")]
    WaitTimeout {
        /// Stack name
        stack: String,
        /// Timeout in seconds
        timeout_secs: u64,
    },

    // ========================================================================
    // I/O and Serialization
    // ========================================================================
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new AWS error from an SDK error, keeping the service error code.
    pub fn aws<E>(operation: &'static str, err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let code = err.code().map(str::to_string);
        let message = match err.message() {
            Some(message) => message.to_string(),
            None => DisplayErrorContext(&err).to_string(),
        };
        Self::Aws {
            operation,
            code,
            message,
            source: Some(Box::new(err)),
        }
    }

    /// Returns the AWS error code, if this is an AWS error that carried one.
    pub fn aws_code(&self) -> Option<&str> {
        match self {
            Error::Aws { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Creates a new config parse error.
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error is a failed pre-flight check that the user
    /// can fix by following printed guidance.
    pub fn is_preflight_failure(&self) -> bool {
        matches!(
            self,
            Error::ParameterNotFound { .. } | Error::KeyPairNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_not_found_message() {
        let err = Error::ParameterNotFound {
            name: "/claude-server/code-server-password".into(),
            region: "us-east-1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/claude-server/code-server-password"));
        assert!(msg.contains("us-east-1"));
        assert!(err.is_preflight_failure());
    }

    #[test]
    fn test_aws_error_is_not_preflight_failure() {
        let err = Error::Aws {
            operation: "GetParameter",
            code: Some("AccessDeniedException".into()),
            message: "not authorized".into(),
            source: None,
        };
        assert!(!err.is_preflight_failure());
        assert!(err.to_string().contains("not authorized"));
    }
}
