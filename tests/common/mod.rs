//! Shared helpers for tests that talk to a local stand-in for AWS.
//!
//! Every SDK client is pointed at a wiremock server, with static credentials
//! so the AWS credential chain never leaves the process.

#![allow(dead_code)]

use assert_cmd::Command;
use aws_config::SdkConfig;
use wiremock::matchers::{body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REGION: &str = "us-west-2";
pub const ACCESS_KEY_ID: &str = "AKIDEXAMPLE";
pub const SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

/// SDK configuration for `REGION` against `server`.
///
/// Sets process-wide credential variables; callers should be `#[serial]`.
pub async fn sdk_config(server: &MockServer) -> SdkConfig {
    std::env::set_var("AWS_ACCESS_KEY_ID", ACCESS_KEY_ID);
    std::env::set_var("AWS_SECRET_ACCESS_KEY", SECRET_ACCESS_KEY);
    std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");

    claude_server::aws::load_sdk_config_for(REGION, Some(&server.uri())).await
}

/// The binary, pointed at `endpoint` with static credentials.
pub fn claude_server_cmd(endpoint: &str) -> Command {
    let mut cmd = Command::cargo_bin("claude-server").unwrap();
    cmd.env("CLAUDE_SERVER_ENDPOINT_URL", endpoint)
        .env("AWS_ACCESS_KEY_ID", ACCESS_KEY_ID)
        .env("AWS_SECRET_ACCESS_KEY", SECRET_ACCESS_KEY)
        .env("AWS_EC2_METADATA_DISABLED", "true")
        .env("AWS_CONFIG_FILE", "/nonexistent/aws/config")
        .env("AWS_SHARED_CREDENTIALS_FILE", "/nonexistent/aws/credentials")
        .env("NO_COLOR", "1")
        .env_remove("AWS_PROFILE")
        .env_remove("AWS_SESSION_TOKEN")
        .env_remove("CLAUDE_SERVER_CONFIG");
    cmd
}

// ============================================================================
// SSM (awsJson1.1)
// ============================================================================

pub fn aws_json_error(kind: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_raw(
        serde_json::json!({ "__type": kind, "message": message }).to_string(),
        "application/x-amz-json-1.1",
    )
}

pub async fn mock_ssm(server: &MockServer, operation: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(header("x-amz-target", format!("AmazonSSM.{operation}").as_str()))
        .respond_with(response)
        .mount(server)
        .await;
}

// ============================================================================
// EC2 and CloudFormation (query protocols, form-encoded requests)
// ============================================================================

pub fn xml(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), "text/xml")
}

/// An EC2 error document.
pub fn ec2_error(code: &str, message: &str) -> ResponseTemplate {
    xml(
        400,
        &format!(
            "<Response><Errors><Error><Code>{code}</Code><Message>{message}</Message></Error>\
             </Errors><RequestID>8f7724cf-496f-496e-8fe3-example</RequestID></Response>"
        ),
    )
}

/// A CloudFormation error document.
pub fn cloudformation_error(code: &str, message: &str) -> ResponseTemplate {
    xml(
        400,
        &format!(
            "<ErrorResponse xmlns=\"http://cloudformation.amazonaws.com/doc/2010-05-15/\">\
             <Error><Type>Sender</Type><Code>{code}</Code><Message>{message}</Message></Error>\
             <RequestId>b9b4b068-3a41-11e5-94eb-example</RequestId></ErrorResponse>"
        ),
    )
}

/// Mount a response for a query-protocol `Action`.
pub async fn mock_action(server: &MockServer, action: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_string_contains(format!("Action={action}&").as_str()))
        .respond_with(response)
        .mount(server)
        .await;
}
