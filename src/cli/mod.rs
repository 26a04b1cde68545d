//! CLI module for claude-server
//!
//! Argument parsing and subcommand dispatch.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// claude-server - a code-server development box on EC2
///
/// Validates the SSM password parameter, synthesizes the CloudFormation stack,
/// and deploys it.
#[derive(Parser, Debug, Clone)]
#[command(name = "claude-server")]
#[command(author = "Claude Server Contributors")]
#[command(version)]
#[command(about = "Provision a code-server development box on EC2", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (TOML, YAML, or JSON)
    #[arg(short = 'c', long, global = true, env = "CLAUDE_SERVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// AWS account the stack is bound to
    #[arg(long, global = true, env = "CDK_DEFAULT_ACCOUNT")]
    pub account: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON lines for scripting
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run pre-flight checks and write the CloudFormation template
    Synth(commands::synth::SynthArgs),

    /// Run pre-flight checks, synthesize, and deploy the stack
    Deploy(commands::deploy::DeployArgs),

    /// Delete the stack
    Destroy(commands::destroy::DestroyArgs),

    /// Run pre-flight checks only
    Check(commands::check::CheckArgs),

    /// Store the configured password in the SSM parameter
    #[command(name = "store-password")]
    StorePassword(commands::password::StorePasswordArgs),

    /// Print the resolved configuration
    #[command(name = "show-config")]
    ShowConfig,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["claude-server", "synth"]).unwrap();
        assert!(matches!(cli.command, Commands::Synth(_)));
    }

    #[test]
    fn test_verbosity_is_capped() {
        let cli = Cli::try_parse_from(["claude-server", "-vvvvv", "check"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "claude-server",
            "deploy",
            "--config",
            "prod.toml",
            "--account",
            "123456789012",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
        assert_eq!(cli.account.as_deref(), Some("123456789012"));
        assert!(cli.is_json());
    }

    #[test]
    fn test_subcommand_names() {
        let cli = Cli::try_parse_from(["claude-server", "store-password"]).unwrap();
        assert!(matches!(cli.command, Commands::StorePassword(_)));
        let cli = Cli::try_parse_from(["claude-server", "show-config"]).unwrap();
        assert!(matches!(cli.command, Commands::ShowConfig));
    }
}
