//! Instance bootstrap script.
//!
//! The script installs code-server behind Caddy (which obtains the Let's
//! Encrypt certificate), then Node.js and Claude Code. The password is read
//! from SSM at boot and never appears in the template.

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use minijinja::{context, Environment};

/// Local port code-server listens on behind the reverse proxy
pub const CODE_SERVER_PORT: u16 = 8080;

/// Login user on the Ubuntu AMI
pub const INSTANCE_USER: &str = "ubuntu";

const BOOTSTRAP_TEMPLATE: &str = r#"#!/bin/bash
set -euo pipefail

exec > >(tee /var/log/claude-server-bootstrap.log) 2>&1

DOMAIN="{{ domain }}"
EMAIL="{{ email }}"
REGION="{{ region }}"
PARAMETER="{{ parameter }}"
USER_HOME="/home/{{ user }}"

export DEBIAN_FRONTEND=noninteractive
apt-get update -y
apt-get install -y curl unzip git gnupg debian-keyring debian-archive-keyring apt-transport-https

if ! command -v aws >/dev/null 2>&1; then
    echo "Installing AWS CLI..."
    curl -fsSL "https://awscli.amazonaws.com/awscli-exe-linux-$(uname -m).zip" -o /tmp/awscliv2.zip
    unzip -q /tmp/awscliv2.zip -d /tmp
    /tmp/aws/install
fi

PASSWORD=$(aws ssm get-parameter \
    --name "$PARAMETER" \
    --with-decryption \
    --region "$REGION" \
    --query Parameter.Value \
    --output text)
# JSON string, so any password is a valid quoted YAML scalar
PASSWORD_YAML=$(printf '%s' "$PASSWORD" | python3 -c 'import json,sys; print(json.dumps(sys.stdin.read()))')

echo "Installing code-server..."
curl -fsSL https://code-server.dev/install.sh | sh
mkdir -p "$USER_HOME/.config/code-server"
cat > "$USER_HOME/.config/code-server/config.yaml" <<EOF
bind-addr: 127.0.0.1:{{ port }}
auth: password
password: ${PASSWORD_YAML}
cert: false
EOF
chmod 600 "$USER_HOME/.config/code-server/config.yaml"
chown -R {{ user }}:{{ user }} "$USER_HOME/.config"
systemctl enable --now code-server@{{ user }}

echo "Installing Caddy..."
curl -1sLf https://dl.cloudsmith.io/public/caddy/stable/gpg.key \
    | gpg --dearmor -o /usr/share/keyrings/caddy-stable-archive-keyring.gpg
curl -1sLf https://dl.cloudsmith.io/public/caddy/stable/debian.deb.txt \
    > /etc/apt/sources.list.d/caddy-stable.list
apt-get update -y
apt-get install -y caddy
cat > /etc/caddy/Caddyfile <<EOF
{
    email ${EMAIL}
}

${DOMAIN} {
    reverse_proxy 127.0.0.1:{{ port }}
}
EOF
systemctl restart caddy

echo "Installing Node.js and Claude Code..."
curl -fsSL https://deb.nodesource.com/setup_20.x | bash -
apt-get install -y nodejs
npm install -g @anthropic-ai/claude-code

echo "Bootstrap complete: https://${DOMAIN}"
"#;

/// Characters that would break out of a double-quoted bash string.
const FORBIDDEN: &[char] = &['"', '\\', '`', '$', '\n', '\r'];

/// Reject values that are unsafe to interpolate into the bootstrap script.
pub fn validate_shell_input(value: &str, field: &'static str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::UnsafeValue {
            field,
            message: "cannot be empty".to_string(),
        });
    }
    if let Some(bad) = value.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(Error::UnsafeValue {
            field,
            message: format!("contains forbidden character {bad:?}"),
        });
    }
    Ok(())
}

/// Render the bootstrap script for a configuration.
pub fn render(config: &ServerConfig) -> Result<String> {
    validate_shell_input(&config.domain, "domain")?;
    validate_shell_input(&config.email, "email")?;
    validate_shell_input(&config.region, "region")?;
    validate_shell_input(
        &config.ssm_password_parameter_name,
        "ssm_password_parameter_name",
    )?;

    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_template("bootstrap.sh", BOOTSTRAP_TEMPLATE)?;

    let script = env.get_template("bootstrap.sh")?.render(context! {
        domain => &config.domain,
        email => &config.email,
        region => &config.region,
        parameter => &config.ssm_password_parameter_name,
        user => INSTANCE_USER,
        port => CODE_SERVER_PORT,
    })?;

    Ok(script)
}
