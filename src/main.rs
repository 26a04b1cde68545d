//! claude-server - a code-server development box on EC2
//!
//! This is the main entry point for the claude-server CLI.

mod cli;

use anyhow::Result;
use cli::commands::CommandContext;
use cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    if cli.verbosity() >= 2 {
        eprintln!("claude-server v{}", VERSION);
    }

    let mut ctx = CommandContext::new(&cli);

    // Execute the appropriate command
    let exit_code = match &cli.command {
        Commands::Synth(args) => args.execute(&mut ctx).await?,
        Commands::Deploy(args) => args.execute(&mut ctx).await?,
        Commands::Destroy(args) => args.execute(&mut ctx).await?,
        Commands::Check(args) => args.execute(&mut ctx).await?,
        Commands::StorePassword(args) => args.execute(&mut ctx).await?,
        Commands::ShowConfig => show_config(&mut ctx)?,
    };

    std::process::exit(exit_code);
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 3),
        )
        .with(env_filter)
        .init();
}

/// Print the resolved configuration with the password redacted
fn show_config(ctx: &mut CommandContext) -> Result<i32> {
    let config = ctx.load_config()?;
    ctx.output.document(&serde_json::to_value(config.redacted())?);
    Ok(0)
}
