//! Subcommands module for claude-server CLI
//!
//! This module contains all the subcommand implementations.

pub mod check;
pub mod deploy;
pub mod destroy;
pub mod password;
pub mod synth;

use crate::cli::output::OutputFormatter;
use anyhow::{Context, Result};
use claude_server::aws::AwsClients;
use claude_server::config::ServerConfig;
use claude_server::preflight::{remediation, Ec2KeyPairStore, Preflight, SsmParameterStore};
use claude_server::stack::{ClaudeServerStack, StackProps, STACK_NAME};
use std::path::PathBuf;

/// Common context shared between commands
pub struct CommandContext {
    /// Output formatter
    pub output: OutputFormatter,
    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
    /// Account the stack is bound to
    pub account: Option<String>,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli) -> Self {
        let output = OutputFormatter::new(!cli.no_color, cli.is_json(), cli.verbosity());

        Self {
            output,
            config_path: cli.config.clone(),
            account: cli.account.clone(),
        }
    }

    /// Load and validate the server configuration
    pub fn load_config(&self) -> Result<ServerConfig> {
        let config = ServerConfig::load(self.config_path.as_deref())
            .context("Failed to load configuration")?;
        self.output.debug(&format!("Configuration: {:?}", config));
        Ok(config)
    }

    /// Build AWS clients for the configured region
    pub async fn aws_clients(&self, config: &ServerConfig) -> AwsClients {
        self.output.debug(&format!("Using AWS region {}", config.region));
        AwsClients::from_config(config).await
    }

    /// Run the pre-flight checks.
    ///
    /// Returns `Ok(false)` after printing remediation steps when a check
    /// failed; any other error is returned unchanged.
    pub async fn preflight(
        &self,
        config: &ServerConfig,
        clients: &AwsClients,
        check_key_pair: bool,
    ) -> Result<bool> {
        let parameters = SsmParameterStore::new(clients.ssm.clone());
        let key_pairs = Ec2KeyPairStore::new(clients.ec2.clone());

        let mut checks = Preflight::new(config, &parameters);
        if check_key_pair {
            checks = checks.with_key_pairs(&key_pairs);
        }

        match checks.run().await {
            Ok(()) => {
                self.output.info("Pre-flight checks passed");
                Ok(true)
            }
            Err(err) if err.is_preflight_failure() => {
                self.output.error(&err.to_string());
                if let Some(steps) = remediation(&err) {
                    self.output.hint(&steps);
                }
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Describe the stack for a configuration
    pub fn build_stack(&self, config: &ServerConfig) -> Result<ClaudeServerStack> {
        let props = StackProps::for_config(config, self.account.clone());
        self.output.debug(&format!("Stack environment {}", props.env.uri()));
        ClaudeServerStack::new(STACK_NAME, config, props).context("Failed to build stack")
    }
}
