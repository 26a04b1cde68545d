//! The `ClaudeServerStack` description.
//!
//! The stack is a single EC2 instance running code-server and Claude Code,
//! reachable at the configured domain:
//!
//! ```text
//!   Route 53 A record (domain)
//!            │
//!            ▼
//!       Elastic IP ──► EC2 instance ◄── instance profile (ssm:GetParameter)
//!                        │   │
//!          security group    gp3 root volume
//!          (22, 80, 443)
//! ```
//!
//! Building the stack only produces a CloudFormation [`Template`]; creating the
//! resources is left to CloudFormation (see [`crate::deploy`]).

pub mod template;
pub mod user_data;

use crate::config::ServerConfig;
use crate::error::Result;
use serde_json::json;
use template::{base64, get_att, ref_, sub, tags, Output, Parameter, Resource, Template};

/// Name of the stack as seen by CloudFormation
pub const STACK_NAME: &str = "ClaudeServerStack";

/// Stack description
pub const STACK_DESCRIPTION: &str =
    "Remote development environment with code-server and Claude Code";

/// Placeholder used in environment names when no account is known
pub const UNKNOWN_ACCOUNT: &str = "unknown-account";

/// Value of the `Name` tag on tagged resources
const NAME_TAG: &str = "claude-server";

/// Public SSM parameter resolving to the current Ubuntu 22.04 AMI.
const UBUNTU_AMI_PARAMETER: &str =
    "/aws/service/canonical/ubuntu/server/22.04/stable/current/{arch}/hvm/ebs-gp2/ami-id";

/// Ports open to the internet: SSH, HTTP (ACME challenge), HTTPS
const INGRESS_PORTS: &[(u16, &str)] = &[(22, "SSH"), (80, "HTTP"), (443, "HTTPS")];

/// Account and region a stack is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEnvironment {
    pub account: Option<String>,
    pub region: String,
}

impl StackEnvironment {
    pub fn new(account: Option<String>, region: impl Into<String>) -> Self {
        Self {
            account,
            region: region.into(),
        }
    }

    /// `aws://<account>/<region>`, as recorded in the assembly manifest.
    pub fn uri(&self) -> String {
        format!(
            "aws://{}/{}",
            self.account.as_deref().unwrap_or(UNKNOWN_ACCOUNT),
            self.region
        )
    }
}

/// Properties common to every stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackProps {
    pub env: StackEnvironment,
    pub description: String,
}

impl StackProps {
    /// Default properties for a configuration and an optional account.
    pub fn for_config(config: &ServerConfig, account: Option<String>) -> Self {
        Self {
            env: StackEnvironment::new(account, config.region.clone()),
            description: STACK_DESCRIPTION.to_string(),
        }
    }
}

/// CPU architecture of an instance type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Arm64,
    Amd64,
}

impl Architecture {
    /// Infer the architecture from an instance type name.
    ///
    /// Graviton families carry a `g` after the generation digit
    /// (`t4g`, `m7gd`, `c6gn`), plus the first-generation `a1` family;
    /// everything else is treated as x86.
    pub fn for_instance_type(instance_type: &str) -> Self {
        let family = instance_type.split('.').next().unwrap_or(instance_type);
        if family == "a1" {
            return Architecture::Arm64;
        }
        let suffix = family
            .find(|c: char| c.is_ascii_digit())
            .map(|i| family[i..].trim_start_matches(|c: char| c.is_ascii_digit()))
            .unwrap_or("");

        if suffix.contains('g') {
            Architecture::Arm64
        } else {
            Architecture::Amd64
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Arm64 => "arm64",
            Architecture::Amd64 => "amd64",
        }
    }
}

/// The code-server stack.
#[derive(Debug, Clone)]
pub struct ClaudeServerStack {
    name: String,
    props: StackProps,
    template: Template,
}

impl ClaudeServerStack {
    /// Describe the stack for a validated configuration.
    pub fn new(name: &str, config: &ServerConfig, props: StackProps) -> Result<Self> {
        let template = build_template(config, &props)?;
        Ok(Self {
            name: name.to_string(),
            props,
            template,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn props(&self) -> &StackProps {
        &self.props
    }

    pub fn environment(&self) -> &StackEnvironment {
        &self.props.env
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

/// ARN of an SSM parameter in the deploying account, as a `Fn::Sub` string.
fn parameter_arn(name: &str) -> String {
    let path = name.strip_prefix('/').unwrap_or(name);
    format!("arn:${{AWS::Partition}}:ssm:${{AWS::Region}}:${{AWS::AccountId}}:parameter/{path}")
}

fn build_template(config: &ServerConfig, props: &StackProps) -> Result<Template> {
    let mut t = Template::new(props.description.clone());
    let arch = Architecture::for_instance_type(&config.instance_type);

    let image_id = t.add_parameter(
        "ImageId",
        Parameter {
            kind: "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>".to_string(),
            default: Some(json!(UBUNTU_AMI_PARAMETER.replace("{arch}", arch.as_str()))),
            description: Some(format!("Ubuntu 22.04 {} AMI", arch.as_str())),
        },
    );

    let ingress: Vec<_> = INGRESS_PORTS
        .iter()
        .map(|(port, label)| {
            json!({
                "IpProtocol": "tcp",
                "FromPort": port,
                "ToPort": port,
                "CidrIp": "0.0.0.0/0",
                "Description": format!("{label} from anywhere"),
            })
        })
        .collect();

    let security_group = t.add_resource(
        "ServerSecurityGroup",
        Resource::new(
            "AWS::EC2::SecurityGroup",
            json!({
                "GroupDescription": "code-server access (SSH, HTTP, HTTPS)",
                "SecurityGroupIngress": ingress,
                "Tags": tags([("Name", NAME_TAG)]),
            }),
        ),
    );

    let role = t.add_resource(
        "ServerRole",
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": "ec2.amazonaws.com" },
                        "Action": "sts:AssumeRole",
                    }],
                },
                "ManagedPolicyArns": [
                    sub("arn:${AWS::Partition}:iam::aws:policy/AmazonSSMManagedInstanceCore"),
                ],
                "Policies": [{
                    "PolicyName": "ReadCodeServerPassword",
                    "PolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Action": "ssm:GetParameter",
                            "Resource": sub(&parameter_arn(&config.ssm_password_parameter_name)),
                        }],
                    },
                }],
                "Tags": tags([("Name", NAME_TAG)]),
            }),
        ),
    );

    let profile = t.add_resource(
        "ServerInstanceProfile",
        Resource::new(
            "AWS::IAM::InstanceProfile",
            json!({ "Roles": [ref_(&role)] }),
        ),
    );

    let script = user_data::render(config)?;

    let instance = t.add_resource(
        "ServerInstance",
        Resource::new(
            "AWS::EC2::Instance",
            json!({
                "ImageId": ref_(&image_id),
                "InstanceType": config.instance_type,
                "KeyName": config.key_pair_name,
                "IamInstanceProfile": ref_(&profile),
                "SecurityGroupIds": [get_att(&security_group, "GroupId")],
                "BlockDeviceMappings": [{
                    "DeviceName": "/dev/sda1",
                    "Ebs": {
                        "VolumeSize": config.volume_size,
                        "VolumeType": "gp3",
                        "Encrypted": true,
                        "DeleteOnTermination": true,
                    },
                }],
                "UserData": base64(json!(script)),
                "Tags": tags([("Name", NAME_TAG)]),
            }),
        ),
    );

    let eip = t.add_resource(
        "ServerEip",
        Resource::new(
            "AWS::EC2::EIP",
            json!({
                "Domain": "vpc",
                "InstanceId": ref_(&instance),
                "Tags": tags([("Name", NAME_TAG)]),
            }),
        ),
    );

    t.add_resource(
        "ServerDnsRecord",
        Resource::new(
            "AWS::Route53::RecordSet",
            json!({
                "HostedZoneId": config.hosted_zone_id,
                "Name": config.domain,
                "Type": "A",
                "TTL": "300",
                "ResourceRecords": [ref_(&eip)],
            }),
        ),
    );

    t.add_output(
        "Url",
        Output::new(json!(format!("https://{}", config.domain)), "code-server URL"),
    );
    t.add_output("PublicIp", Output::new(ref_(&eip), "Elastic IP of the server"));
    t.add_output("InstanceId", Output::new(ref_(&instance), "EC2 instance ID"));
    t.add_output(
        "SshCommand",
        Output::new(
            sub(&format!(
                "ssh -i {}.pem {}@${{{}}}",
                config.key_pair_name,
                user_data::INSTANCE_USER,
                eip
            )),
            "SSH into the server",
        ),
    );

    Ok(t)
}
