//! CloudFormation wire tests for the stack API.

mod common;

use claude_server::deploy::{CloudFormationApi, StackApi, StackPhase};
use common::*;
use serial_test::serial;
use wiremock::MockServer;

const STACK: &str = "ClaudeServerStack";

async fn api(server: &MockServer) -> CloudFormationApi {
    CloudFormationApi::new(aws_sdk_cloudformation::Client::new(
        &sdk_config(server).await,
    ))
}

#[tokio::test]
#[serial]
async fn test_describe_missing_stack_is_none() {
    let server = MockServer::start().await;
    mock_action(
        &server,
        "DescribeStacks",
        cloudformation_error("ValidationError", "Stack with id ClaudeServerStack does not exist"),
    )
    .await;

    let api = api(&server).await;
    assert_eq!(api.describe(STACK).await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_describe_reads_status_and_outputs() {
    let server = MockServer::start().await;
    mock_action(
        &server,
        "DescribeStacks",
        xml(
            200,
            r#"<DescribeStacksResponse xmlns="http://cloudformation.amazonaws.com/doc/2010-05-15/">
  <DescribeStacksResult>
    <Stacks>
      <member>
        <StackName>ClaudeServerStack</StackName>
        <StackId>arn:aws:cloudformation:us-west-2:123456789012:stack/ClaudeServerStack/abc</StackId>
        <CreationTime>2026-01-01T00:00:00Z</CreationTime>
        <StackStatus>CREATE_COMPLETE</StackStatus>
        <Outputs>
          <member>
            <OutputKey>Url</OutputKey>
            <OutputValue>https://dev.example.com</OutputValue>
          </member>
        </Outputs>
      </member>
    </Stacks>
  </DescribeStacksResult>
  <ResponseMetadata><RequestId>b9b4b068-3a41-11e5-94eb-example</RequestId></ResponseMetadata>
</DescribeStacksResponse>"#,
        ),
    )
    .await;

    let api = api(&server).await;
    let state = api.describe(STACK).await.unwrap().unwrap();
    assert_eq!(state.name, STACK);
    assert_eq!(state.status, "CREATE_COMPLETE");
    assert_eq!(state.phase(), StackPhase::Succeeded);
    assert_eq!(state.outputs["Url"], "https://dev.example.com");
}

#[tokio::test]
#[serial]
async fn test_update_without_changes_is_false() {
    let server = MockServer::start().await;
    mock_action(
        &server,
        "UpdateStack",
        cloudformation_error("ValidationError", "No updates are to be performed."),
    )
    .await;

    let api = api(&server).await;
    assert!(!api.update(STACK, "{}").await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_update_other_validation_error_propagates() {
    let server = MockServer::start().await;
    mock_action(
        &server,
        "UpdateStack",
        cloudformation_error("ValidationError", "Template format error: JSON not well-formed."),
    )
    .await;

    let api = api(&server).await;
    let err = api.update(STACK, "{").await.unwrap_err();
    assert_eq!(err.aws_code(), Some("ValidationError"));
}
