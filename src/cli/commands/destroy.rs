//! Destroy command

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use claude_server::deploy::{CloudFormationApi, StackDeployer};
use claude_server::stack::STACK_NAME;
use claude_server::wait::WaitConfig;
use std::time::Duration;

/// Arguments for the destroy command
#[derive(Parser, Debug, Clone)]
pub struct DestroyArgs {
    /// Return as soon as CloudFormation accepts the deletion
    #[arg(long)]
    pub no_wait: bool,

    /// Maximum time to wait for the deletion, in seconds
    #[arg(long, default_value = "1800")]
    pub timeout: u64,
}

impl DestroyArgs {
    /// Execute the destroy command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let config = ctx.load_config()?;
        let clients = ctx.aws_clients(&config).await;

        ctx.output.banner("DESTROY");

        let api = CloudFormationApi::new(clients.cloudformation.clone());
        let deployer = StackDeployer::new(&api)
            .with_wait_config(WaitConfig::with_timeout(Duration::from_secs(self.timeout)));

        if deployer.destroy(STACK_NAME, !self.no_wait).await? {
            ctx.output.success(&format!("{} deleted", STACK_NAME));
        } else {
            ctx.output.warning(&format!("{} does not exist in {}", STACK_NAME, config.region));
        }

        ctx.output.hint(&format!(
            "The SSM parameter {} is not part of the stack and was left in place",
            config.ssm_password_parameter_name
        ));
        Ok(0)
    }
}
