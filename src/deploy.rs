//! Handing a synthesized stack to CloudFormation.
//!
//! The deployer creates the stack when it does not exist and updates it
//! otherwise. A stack left in `ROLLBACK_COMPLETE` by a failed first create
//! cannot be updated; the deploy fails and the stack has to be destroyed
//! first.

use crate::error::{Error, Result};
use crate::wait::{poll_until, WaitConfig};
use async_trait::async_trait;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_cloudformation::types::{Capability, StackStatus};
use indexmap::IndexMap;
use tracing::{debug, info};

/// Status of a stack whose first create failed and rolled back.
const ROLLBACK_COMPLETE: &str = "ROLLBACK_COMPLETE";

/// Message CloudFormation returns for an update with no changes.
const NO_UPDATES: &str = "No updates are to be performed";

/// Where a stack status sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPhase {
    InProgress,
    Succeeded,
    Failed,
}

/// Classify a CloudFormation stack status string.
pub fn classify_status(status: &str) -> StackPhase {
    if status.ends_with("_IN_PROGRESS") {
        return StackPhase::InProgress;
    }
    match status {
        "CREATE_COMPLETE" | "UPDATE_COMPLETE" | "DELETE_COMPLETE" | "IMPORT_COMPLETE" => {
            StackPhase::Succeeded
        }
        _ => StackPhase::Failed,
    }
}

/// Snapshot of a stack as reported by CloudFormation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackState {
    pub name: String,
    pub status: String,
    pub reason: Option<String>,
    pub outputs: IndexMap<String, String>,
}

impl StackState {
    pub fn phase(&self) -> StackPhase {
        classify_status(&self.status)
    }

    fn from_sdk(stack: &aws_sdk_cloudformation::types::Stack) -> Self {
        let outputs = stack
            .outputs()
            .iter()
            .filter_map(|o| match (o.output_key(), o.output_value()) {
                (Some(k), Some(v)) => Some((k.to_string(), v.to_string())),
                _ => None,
            })
            .collect();

        Self {
            name: stack.stack_name().unwrap_or_default().to_string(),
            status: stack
                .stack_status()
                .map(StackStatus::as_str)
                .unwrap_or_default()
                .to_string(),
            reason: stack.stack_status_reason().map(str::to_string),
            outputs,
        }
    }
}

/// The CloudFormation operations the deployer needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StackApi: Send + Sync {
    /// Current state of the stack, or `None` if it does not exist.
    async fn describe(&self, name: &str) -> Result<Option<StackState>>;

    async fn create(&self, name: &str, template_body: &str) -> Result<()>;

    /// Start an update; `Ok(false)` means there was nothing to change.
    async fn update(&self, name: &str, template_body: &str) -> Result<bool>;

    async fn delete(&self, name: &str) -> Result<()>;
}

/// [`StackApi`] backed by the CloudFormation SDK client.
pub struct CloudFormationApi {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationApi {
    pub fn new(client: aws_sdk_cloudformation::Client) -> Self {
        Self { client }
    }
}

fn is_missing_stack<E: ProvideErrorMetadata>(err: &E) -> bool {
    err.code() == Some("ValidationError")
        && err.message().is_some_and(|m| m.contains("does not exist"))
}

fn is_no_updates<E: ProvideErrorMetadata>(err: &E) -> bool {
    err.code() == Some("ValidationError") && err.message().is_some_and(|m| m.contains(NO_UPDATES))
}

#[async_trait]
impl StackApi for CloudFormationApi {
    async fn describe(&self, name: &str) -> Result<Option<StackState>> {
        match self.client.describe_stacks().stack_name(name).send().await {
            Ok(output) => Ok(output.stacks().first().map(StackState::from_sdk)),
            Err(err) if is_missing_stack(&err) => Ok(None),
            Err(err) => Err(Error::aws("DescribeStacks", err)),
        }
    }

    async fn create(&self, name: &str, template_body: &str) -> Result<()> {
        let output = self
            .client
            .create_stack()
            .stack_name(name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityIam)
            .send()
            .await
            .map_err(|e| Error::aws("CreateStack", e))?;

        debug!("CreateStack started: {:?}", output.stack_id());
        Ok(())
    }

    async fn update(&self, name: &str, template_body: &str) -> Result<bool> {
        match self
            .client
            .update_stack()
            .stack_name(name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityIam)
            .send()
            .await
        {
            Ok(output) => {
                debug!("UpdateStack started: {:?}", output.stack_id());
                Ok(true)
            }
            Err(err) if is_no_updates(&err) => Ok(false),
            Err(err) => Err(Error::aws("UpdateStack", err)),
        }
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.client
            .delete_stack()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| Error::aws("DeleteStack", e))?;
        Ok(())
    }
}

/// What a deploy did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAction {
    Created,
    Updated,
    Unchanged,
}

/// Result of a deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub action: DeployAction,
    /// Final state, when the deploy waited or nothing changed
    pub state: Option<StackState>,
}

/// Creates, updates, and deletes a stack through a [`StackApi`].
pub struct StackDeployer<'a> {
    api: &'a dyn StackApi,
    wait: WaitConfig,
}

impl<'a> StackDeployer<'a> {
    pub fn new(api: &'a dyn StackApi) -> Self {
        Self {
            api,
            wait: WaitConfig::default(),
        }
    }

    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Create or update `name` from `template_body`.
    ///
    /// With `wait`, polls until the stack settles and fails if it settles in a
    /// failed state.
    pub async fn deploy(
        &self,
        name: &str,
        template_body: &str,
        wait: bool,
    ) -> Result<DeployReport> {
        let action = match self.api.describe(name).await? {
            Some(state) if state.phase() == StackPhase::InProgress => {
                return Err(Error::DeployFailed {
                    stack: name.to_string(),
                    status: state.status,
                    reason: "another operation is in progress".to_string(),
                });
            }
            Some(state) if state.status == ROLLBACK_COMPLETE => {
                return Err(Error::DeployFailed {
                    stack: name.to_string(),
                    status: state.status,
                    reason: "a failed create cannot be updated; run `claude-server destroy` \
                             and deploy again"
                        .to_string(),
                });
            }
            Some(_) => {
                if self.api.update(name, template_body).await? {
                    DeployAction::Updated
                } else {
                    info!("Stack {} is up to date", name);
                    DeployAction::Unchanged
                }
            }
            None => {
                self.api.create(name, template_body).await?;
                DeployAction::Created
            }
        };

        info!("Stack {}: {:?}", name, action);

        let state = if action == DeployAction::Unchanged {
            self.api.describe(name).await?
        } else if wait {
            Some(self.expect_success(name).await?)
        } else {
            None
        };

        Ok(DeployReport { action, state })
    }

    /// Delete `name`. Returns `false` if the stack did not exist.
    pub async fn destroy(&self, name: &str, wait: bool) -> Result<bool> {
        if self.api.describe(name).await?.is_none() {
            info!("Stack {} does not exist", name);
            return Ok(false);
        }

        self.api.delete(name).await?;

        if wait {
            if let Some(state) = self.wait_settled(name).await? {
                if state.phase() == StackPhase::Failed {
                    return Err(Error::DeployFailed {
                        stack: name.to_string(),
                        status: state.status,
                        reason: state.reason.unwrap_or_default(),
                    });
                }
            }
        }

        Ok(true)
    }

    /// Poll until the stack leaves every `*_IN_PROGRESS` status. `None` means
    /// the stack no longer exists.
    pub async fn wait_settled(&self, name: &str) -> Result<Option<StackState>> {
        let api = self.api;
        poll_until(&self.wait, name, || async move {
            Ok(match api.describe(name).await? {
                None => Some(None),
                Some(state) if state.phase() == StackPhase::InProgress => {
                    debug!("Stack {} is {}", name, state.status);
                    None
                }
                Some(state) => Some(Some(state)),
            })
        })
        .await
    }

    async fn expect_success(&self, name: &str) -> Result<StackState> {
        match self.wait_settled(name).await? {
            Some(state) if state.phase() == StackPhase::Succeeded => Ok(state),
            Some(state) => Err(Error::DeployFailed {
                stack: name.to_string(),
                status: state.status,
                reason: state.reason.unwrap_or_default(),
            }),
            None => Err(Error::DeployFailed {
                stack: name.to_string(),
                status: "DELETE_COMPLETE".to_string(),
                reason: "stack disappeared while deploying".to_string(),
            }),
        }
    }
}
