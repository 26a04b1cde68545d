//! store-password command
//!
//! Writes `code_server_password` from the configuration into the SSM
//! SecureString parameter that the pre-flight check looks for.

use super::CommandContext;
use anyhow::{bail, Result};
use clap::Parser;
use claude_server::preflight::{ParameterStore, SsmParameterStore};
use claude_server::Error;

/// Shortest password `store-password` will write
const MIN_PASSWORD_LENGTH: usize = 8;

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        bail!(
            "code_server_password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        );
    }
    Ok(())
}

/// Arguments for the store-password command
#[derive(Parser, Debug, Clone)]
pub struct StorePasswordArgs {
    /// Replace the parameter if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

impl StorePasswordArgs {
    /// Execute the store-password command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let config = ctx.load_config()?;

        let Some(password) = config.code_server_password.as_deref() else {
            bail!(
                "code_server_password is not set; add it to the configuration file \
                 or set CLAUDE_SERVER_PASSWORD"
            );
        };
        check_password(password)?;

        let clients = ctx.aws_clients(&config).await;
        let store = SsmParameterStore::new(clients.ssm.clone());

        match store
            .put_secure(&config.ssm_password_parameter_name, password, self.overwrite)
            .await
        {
            Ok(()) => {
                ctx.output.success(&format!(
                    "Stored password in {} ({})",
                    config.ssm_password_parameter_name, config.region
                ));
                Ok(0)
            }
            Err(err @ Error::ParameterExists(_)) => {
                ctx.output.error(&err.to_string());
                Ok(1)
            }
            Err(err) => Err(err.into()),
        }
    }
}
