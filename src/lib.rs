//! # claude-server
//!
//! Provisions a single EC2 instance running code-server and Claude Code behind
//! an HTTPS reverse proxy, reachable at a Route 53 domain.
//!
//! ## Flow
//!
//! ```text
//!   config file + CLAUDE_SERVER_* env
//!                 │
//!                 ▼
//!          ServerConfig (validated, immutable)
//!                 │
//!                 ▼
//!   pre-flight: SSM parameter exists? ── no ──► remediation, exit 1
//!                 │ yes
//!                 ▼
//!   ClaudeServerStack ──► CloudFormation template (cdk.out/)
//!                 │
//!                 ▼
//!   CloudFormation create/update (deploy)
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use claude_server::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ServerConfig::load(None)?;
//!     let clients = AwsClients::from_config(&config).await;
//!
//!     let store = SsmParameterStore::new(clients.ssm.clone());
//!     Preflight::new(&config, &store).run().await?;
//!
//!     let props = StackProps::for_config(&config, None);
//!     let stack = ClaudeServerStack::new(STACK_NAME, &config, props)?;
//!     synthesize(&stack, std::path::Path::new("cdk.out"))?;
//!     Ok(())
//! }
//! ```

pub mod aws;
pub mod config;
pub mod deploy;
pub mod error;
pub mod preflight;
pub mod stack;
pub mod synth;
pub mod wait;

pub use error::{Error, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::aws::AwsClients;
    pub use crate::config::{ConfigLayer, ServerConfig};
    pub use crate::deploy::{CloudFormationApi, DeployAction, StackDeployer};
    pub use crate::error::{Error, Result};
    pub use crate::preflight::{
        ensure_parameter_exists, remediation, ParameterStore, Preflight, SsmParameterStore,
    };
    pub use crate::stack::{ClaudeServerStack, StackProps, STACK_NAME};
    pub use crate::synth::synthesize;
}
