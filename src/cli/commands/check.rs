//! Check command - pre-flight checks only

use super::CommandContext;
use anyhow::Result;
use clap::Parser;

/// Arguments for the check command
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Do not verify that the EC2 key pair exists
    #[arg(long)]
    pub skip_key_pair_check: bool,
}

impl CheckArgs {
    /// Execute the check command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let config = ctx.load_config()?;
        let clients = ctx.aws_clients(&config).await;

        ctx.output.banner("PRE-FLIGHT CHECKS");

        if !ctx
            .preflight(&config, &clients, !self.skip_key_pair_check)
            .await?
        {
            return Ok(1);
        }

        ctx.output.success(&format!(
            "SSM parameter {} exists in {}",
            config.ssm_password_parameter_name, config.region
        ));
        if !self.skip_key_pair_check {
            ctx.output.success(&format!("EC2 key pair {} exists", config.key_pair_name));
        }
        Ok(0)
    }
}
