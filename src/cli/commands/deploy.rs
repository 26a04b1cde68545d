//! Deploy command
//!
//! Pre-flight checks, synthesis, then create or update the stack in
//! CloudFormation.

use super::CommandContext;
use anyhow::{Context, Result};
use clap::Parser;
use claude_server::deploy::{CloudFormationApi, DeployAction, StackDeployer};
use claude_server::synth::{synthesize, DEFAULT_OUT_DIR};
use claude_server::wait::WaitConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the deploy command
#[derive(Parser, Debug, Clone)]
pub struct DeployArgs {
    /// Output directory for the cloud assembly
    #[arg(long, short = 'o', default_value = DEFAULT_OUT_DIR)]
    pub out: PathBuf,

    /// Return as soon as CloudFormation accepts the change
    #[arg(long)]
    pub no_wait: bool,

    /// Maximum time to wait for the stack, in seconds
    #[arg(long, default_value = "1800")]
    pub timeout: u64,

    /// Do not verify that the EC2 key pair exists
    #[arg(long)]
    pub skip_key_pair_check: bool,
}

impl DeployArgs {
    /// Execute the deploy command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let config = ctx.load_config()?;
        let clients = ctx.aws_clients(&config).await;

        ctx.output.banner("DEPLOY");

        if !ctx
            .preflight(&config, &clients, !self.skip_key_pair_check)
            .await?
        {
            return Ok(1);
        }

        let stack = ctx.build_stack(&config)?;
        let assembly = synthesize(&stack, &self.out)
            .with_context(|| format!("Failed to write assembly to {}", self.out.display()))?;
        ctx.output.info(&format!(
            "Template written to {}",
            assembly.template_path.display()
        ));

        let api = CloudFormationApi::new(clients.cloudformation.clone());
        let deployer = StackDeployer::new(&api)
            .with_wait_config(WaitConfig::with_timeout(Duration::from_secs(self.timeout)));

        let body = stack.template().to_json()?;
        ctx.output.info(&format!(
            "Deploying {} to {}",
            stack.name(),
            stack.environment().uri()
        ));
        let report = deployer.deploy(stack.name(), &body, !self.no_wait).await?;

        let verb = match report.action {
            DeployAction::Created => "created",
            DeployAction::Updated => "updated",
            DeployAction::Unchanged => "already up to date",
        };

        if self.no_wait && report.action != DeployAction::Unchanged {
            ctx.output.success(&format!(
                "{} {} started; not waiting for completion",
                stack.name(),
                if report.action == DeployAction::Created {
                    "create"
                } else {
                    "update"
                }
            ));
            return Ok(0);
        }

        ctx.output.success(&format!("{} {}", stack.name(), verb));

        if let Some(state) = &report.state {
            if !state.outputs.is_empty() {
                ctx.output.section("Outputs");
                for (key, value) in &state.outputs {
                    ctx.output.field(key, value);
                }
            }
        }

        ctx.output.elapsed();
        Ok(0)
    }
}
