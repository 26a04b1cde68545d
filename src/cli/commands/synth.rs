//! Synth command - write the cloud assembly
//!
//! This module implements the `synth` subcommand: pre-flight checks, then the
//! stack template and manifest are written to the output directory.

use super::CommandContext;
use anyhow::{Context, Result};
use clap::Parser;
use claude_server::synth::{synthesize, DEFAULT_OUT_DIR};
use std::path::PathBuf;

/// Arguments for the synth command
#[derive(Parser, Debug, Clone)]
pub struct SynthArgs {
    /// Output directory for the cloud assembly
    #[arg(long, short = 'o', default_value = DEFAULT_OUT_DIR)]
    pub out: PathBuf,

    /// Skip all pre-flight checks (no AWS calls)
    #[arg(long)]
    pub skip_preflight: bool,

    /// Do not verify that the EC2 key pair exists
    #[arg(long)]
    pub skip_key_pair_check: bool,
}

impl SynthArgs {
    /// Execute the synth command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let config = ctx.load_config()?;

        if self.skip_preflight {
            ctx.output.warning("Skipping pre-flight checks");
        } else {
            let clients = ctx.aws_clients(&config).await;
            if !ctx
                .preflight(&config, &clients, !self.skip_key_pair_check)
                .await?
            {
                return Ok(1);
            }
        }

        let stack = ctx.build_stack(&config)?;
        let assembly = synthesize(&stack, &self.out)
            .with_context(|| format!("Failed to write assembly to {}", self.out.display()))?;

        ctx.output.success(&format!(
            "Synthesized {} to {}",
            stack.name(),
            assembly.template_path.display()
        ));
        ctx.output.elapsed();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synth_args_defaults() {
        let args = SynthArgs::try_parse_from(["synth"]).unwrap();
        assert_eq!(args.out, PathBuf::from("cdk.out"));
        assert!(!args.skip_preflight);
    }

    #[test]
    fn test_synth_args_out() {
        let args = SynthArgs::try_parse_from(["synth", "-o", "build", "--skip-preflight"]).unwrap();
        assert_eq!(args.out, PathBuf::from("build"));
        assert!(args.skip_preflight);
    }
}
