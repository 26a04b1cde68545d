//! Integration tests for configuration loading
//!
//! - TOML, YAML, and JSON files
//! - camelCase keys from existing configuration files
//! - Environment variable overrides
//! - Validation failures

use claude_server::config::{
    ConfigLayer, ServerConfig, DEFAULT_INSTANCE_TYPE, DEFAULT_REGION, DEFAULT_SSM_PARAMETER,
    DEFAULT_VOLUME_SIZE,
};
use claude_server::Error;
use serial_test::serial;
use std::path::Path;
use tempfile::tempdir;

const ENV_VARS: &[&str] = &[
    "CLAUDE_SERVER_DOMAIN",
    "CLAUDE_SERVER_HOSTED_ZONE_ID",
    "CLAUDE_SERVER_PASSWORD",
    "CLAUDE_SERVER_EMAIL",
    "CLAUDE_SERVER_KEY_PAIR_NAME",
    "CLAUDE_SERVER_INSTANCE_TYPE",
    "CLAUDE_SERVER_VOLUME_SIZE",
    "CLAUDE_SERVER_REGION",
    "CLAUDE_SERVER_SSM_PARAMETER",
    "CLAUDE_SERVER_ENDPOINT_URL",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

/// Resolve a single file, without environment overrides.
fn load_file(path: &Path) -> claude_server::Result<ServerConfig> {
    ServerConfig::resolve(ConfigLayer::from_file(path)?)
}

const TOML_CONFIG: &str = r#"
domain = "dev.example.com"
hosted_zone_id = "Z0123456789ABC"
code_server_password = "correct-horse-battery"
email = "ops@example.com"
key_pair_name = "laptop"
"#;

// ============================================================================
// File Format Tests
// ============================================================================

#[test]
fn test_load_toml_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude-server.toml");
    std::fs::write(&path, TOML_CONFIG).unwrap();

    let config = load_file(&path).unwrap();

    assert_eq!(config.domain, "dev.example.com");
    assert_eq!(config.hosted_zone_id, "Z0123456789ABC");
    assert_eq!(
        config.code_server_password.as_deref(),
        Some("correct-horse-battery")
    );
    assert_eq!(config.email, "ops@example.com");
    assert_eq!(config.key_pair_name, "laptop");
    assert_eq!(config.instance_type, DEFAULT_INSTANCE_TYPE);
    assert_eq!(config.volume_size, DEFAULT_VOLUME_SIZE);
    assert_eq!(config.region, DEFAULT_REGION);
    assert_eq!(config.ssm_password_parameter_name, DEFAULT_SSM_PARAMETER);
}

#[test]
fn test_load_yaml_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude-server.yaml");
    std::fs::write(
        &path,
        r#"
domain: box.example.org
hosted_zone_id: ZABCDEF
email: me@example.org
key_pair_name: workstation
instance_type: m7g.large
volume_size: 100
region: eu-central-1
"#,
    )
    .unwrap();

    let config = load_file(&path).unwrap();

    assert_eq!(config.domain, "box.example.org");
    assert_eq!(config.instance_type, "m7g.large");
    assert_eq!(config.volume_size, 100);
    assert_eq!(config.region, "eu-central-1");
    assert_eq!(config.code_server_password, None);
}

#[test]
fn test_load_json_camel_case() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude-server.json");
    std::fs::write(
        &path,
        r#"{
  "domain": "dev.example.com",
  "hostedZoneId": "Z0123456789ABC",
  "codeServerPassword": "correct-horse-battery",
  "email": "ops@example.com",
  "keyPairName": "laptop",
  "instanceType": "t4g.medium",
  "volumeSize": 50
}"#,
    )
    .unwrap();

    let config = load_file(&path).unwrap();

    assert_eq!(config.hosted_zone_id, "Z0123456789ABC");
    assert_eq!(config.key_pair_name, "laptop");
    assert_eq!(config.instance_type, "t4g.medium");
    assert_eq!(config.volume_size, 50);
}

#[test]
fn test_unknown_field_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude-server.toml");
    std::fs::write(&path, format!("{TOML_CONFIG}\nsubdomain = \"dev\"\n")).unwrap();

    let err = load_file(&path).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { .. }));
}

#[test]
fn test_malformed_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude-server.toml");
    std::fs::write(&path, "domain = [unterminated").unwrap();

    let err = load_file(&path).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { .. }));
}

#[test]
fn test_short_password_is_carried() {
    let layer = ConfigLayer {
        domain: Some("dev.example.com".into()),
        hosted_zone_id: Some("Z0123456789ABC".into()),
        code_server_password: Some("short".into()),
        email: Some("ops@example.com".into()),
        key_pair_name: Some("laptop".into()),
        ..ConfigLayer::default()
    };

    let config = ServerConfig::resolve(layer).unwrap();
    assert_eq!(config.code_server_password.as_deref(), Some("short"));
}

// ============================================================================
// Environment Override Tests
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude-server.toml");
    std::fs::write(&path, TOML_CONFIG).unwrap();

    std::env::set_var("CLAUDE_SERVER_INSTANCE_TYPE", "c7g.xlarge");
    std::env::set_var("CLAUDE_SERVER_VOLUME_SIZE", "80");
    std::env::set_var("CLAUDE_SERVER_SSM_PARAMETER", "/team/dev/password");

    let config = ServerConfig::load(Some(&path));
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.domain, "dev.example.com");
    assert_eq!(config.instance_type, "c7g.xlarge");
    assert_eq!(config.volume_size, 80);
    assert_eq!(config.ssm_password_parameter_name, "/team/dev/password");
}

#[test]
#[serial]
fn test_env_supplies_missing_fields() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude-server.toml");
    std::fs::write(&path, "domain = \"dev.example.com\"\n").unwrap();

    std::env::set_var("CLAUDE_SERVER_HOSTED_ZONE_ID", "ZENV");
    std::env::set_var("CLAUDE_SERVER_EMAIL", "env@example.com");
    std::env::set_var("CLAUDE_SERVER_KEY_PAIR_NAME", "ci");

    let config = ServerConfig::load(Some(&path));
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.hosted_zone_id, "ZENV");
    assert_eq!(config.email, "env@example.com");
    assert_eq!(config.key_pair_name, "ci");
}

#[test]
#[serial]
fn test_env_invalid_volume_size() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude-server.toml");
    std::fs::write(&path, TOML_CONFIG).unwrap();

    std::env::set_var("CLAUDE_SERVER_VOLUME_SIZE", "big");

    let result = ServerConfig::load(Some(&path));
    clear_env();

    assert!(matches!(
        result,
        Err(Error::InvalidEnv {
            var: "CLAUDE_SERVER_VOLUME_SIZE",
            ..
        })
    ));
}

#[test]
#[serial]
fn test_explicit_path_missing() {
    clear_env();
    let dir = tempdir().unwrap();

    let err = ServerConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, Error::ConfigRead { .. }));
}
