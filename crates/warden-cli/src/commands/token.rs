//! Token commands.
//!
//! `warden issue` - Issue a signed token for a subject.
//! `warden verify` - Verify a token and print its claims.
//! `warden inspect` - Print a token's claims without verifying it.
//! `warden check` - Verify a token and test a tenant role or permission.

use anyhow::{Context, bail};
use clap::Args;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use warden_jwt::duration::parse_duration;
use warden_jwt::{
    Claims, Config, ExtraClaims, Manager, Permission, Tenant, TokenKind, decode_unverified,
};

/// Where the signing configuration comes from.
#[derive(Args, Debug, Default, Clone)]
pub struct ManagerOptions {
    /// Path to a warden.yaml configuration file
    #[arg(long, global = true, env = "WARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// HMAC signing secret (overrides the configuration file)
    #[arg(long, global = true, env = "WARDEN_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Token issuer (overrides the configuration file)
    #[arg(long, global = true)]
    pub issuer: Option<String>,

    /// Token id prefix (overrides the configuration file)
    #[arg(long, global = true)]
    pub prefix: Option<String>,
}

/// Options for `warden issue`.
#[derive(Args, Debug, Clone)]
pub struct IssueOptions {
    /// Subject (user id)
    #[arg(long)]
    pub sub: String,

    /// Token kind: access, refresh or purpose
    #[arg(long, default_value = "access")]
    pub kind: TokenKind,

    /// Explicit lifetime (e.g. "15m", "7d", "1h30m"); defaults to the kind's TTL
    #[arg(long, allow_hyphen_values = true)]
    pub ttl: Option<String>,

    /// Tenant grant as "tenant:role" (repeatable)
    #[arg(long = "tenant")]
    pub tenants: Vec<String>,

    /// Permission as "tenant:action:resource" (repeatable)
    #[arg(long = "permission")]
    pub permissions: Vec<String>,

    /// Extra top-level claim as "key=value"; JSON values are parsed (repeatable)
    #[arg(long = "extra")]
    pub extra: Vec<String>,

    /// Write the token to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Build a manager from a config file and command-line overrides.
pub fn build_manager(opts: &ManagerOptions) -> anyhow::Result<Manager> {
    let mut config = match &opts.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(secret) = &opts.secret {
        config.secret = secret.clone();
    }
    if let Some(issuer) = &opts.issuer {
        config.issuer = issuer.clone();
    }
    if let Some(prefix) = &opts.prefix {
        config.prefix = prefix.clone();
    }

    if config.secret.is_empty() {
        bail!(
            "Signing secret not provided. Pass --secret, set WARDEN_SECRET, or configure secret/secret_env/secret_file"
        );
    }

    tracing::debug!(?config, "building token manager");
    Manager::new(config).context("Failed to build token manager")
}

/// Read a token given inline or as a path to a file containing it.
fn read_token(token: &str) -> anyhow::Result<String> {
    let path = Path::new(token);
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file: {}", path.display()))?;
        return Ok(content.trim().to_string());
    }
    Ok(token.trim().to_string())
}

/// Parse `--tenant` and `--permission` flags into a tenant map.
fn parse_tenants(
    tenants: &[String],
    permissions: &[String],
) -> anyhow::Result<HashMap<String, Tenant>> {
    let mut out = HashMap::new();

    for arg in tenants {
        let (tenant_id, role) = arg
            .split_once(':')
            .filter(|(t, r)| !t.is_empty() && !r.is_empty())
            .with_context(|| format!("Invalid tenant '{arg}', expected 'tenant:role'"))?;
        out.insert(tenant_id.to_string(), Tenant::new(tenant_id, role));
    }

    for arg in permissions {
        let (tenant_id, permission) = arg
            .split_once(':')
            .with_context(|| {
                format!("Invalid permission '{arg}', expected 'tenant:action:resource'")
            })?;
        let permission: Permission = permission.parse()?;
        let tenant = out.get_mut(tenant_id).with_context(|| {
            format!("Permission '{arg}' refers to tenant '{tenant_id}' which has no --tenant grant")
        })?;
        tenant.permissions.push(permission);
    }

    Ok(out)
}

/// Parse `--extra key=value` flags. Values that are valid JSON keep their type.
fn parse_extra(extra: &[String]) -> anyhow::Result<Option<ExtraClaims>> {
    if extra.is_empty() {
        return Ok(None);
    }

    let mut out = ExtraClaims::new();
    for arg in extra {
        let (key, raw) = arg
            .split_once('=')
            .filter(|(k, _)| !k.is_empty())
            .with_context(|| format!("Invalid extra claim '{arg}', expected 'key=value'"))?;
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        out.insert(key.to_string(), value);
    }
    Ok(Some(out))
}

fn print_claims(claims: &Claims) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(claims)?);
    Ok(())
}

/// Issue a new token.
pub fn issue(manager: &Manager, opts: IssueOptions) -> anyhow::Result<()> {
    let tenants = parse_tenants(&opts.tenants, &opts.permissions)?;
    let extra = parse_extra(&opts.extra)?;

    let (token, claims) = match &opts.ttl {
        Some(ttl) => {
            let ttl = parse_duration(ttl).with_context(|| format!("Invalid --ttl '{ttl}'"))?;
            let token = manager.issue_token(&opts.sub, opts.kind, tenants, extra.as_ref(), ttl)?;
            (token, None)
        }
        None => {
            let issued = match opts.kind {
                TokenKind::Access => {
                    manager.issue_access_token(&opts.sub, tenants, extra.as_ref())?
                }
                TokenKind::Refresh => {
                    manager.issue_refresh_token(&opts.sub, tenants, extra.as_ref())?
                }
                TokenKind::Purpose => {
                    manager.issue_purpose_token(&opts.sub, tenants, extra.as_ref())?
                }
            };
            (issued.token, Some(issued.claims))
        }
    };

    if let Some(output_path) = opts.output {
        fs::write(&output_path, &token)?;
        println!("✔ Token written to: {}", output_path.display());
        println!("  Subject: {}", opts.sub);
        println!("  Kind: {}", opts.kind);
        if let Some(claims) = claims {
            println!("  Token id: {}", claims.jti);
            if let Some(exp) = claims.expires_at {
                println!("  Expires: {}", exp.to_rfc3339());
            }
        }
    } else {
        println!("{token}");
    }

    Ok(())
}

/// Verify a token and print its claims.
pub fn verify(manager: &Manager, token: &str) -> anyhow::Result<()> {
    let token = read_token(token)?;
    let claims = manager
        .parse_claims(&token)
        .context("✖ Token verification failed")?;

    println!("✔ Token is valid");
    println!();
    print_claims(&claims)
}

/// Print a token's claims without verifying it.
pub fn inspect(token: &str) -> anyhow::Result<()> {
    let token = read_token(token)?;
    let claims: Claims = decode_unverified(&token).context("Failed to decode token")?;

    println!("Token Information (signature NOT verified):");
    if claims.is_expired() {
        println!("  Status: expired");
    }
    println!();
    print_claims(&claims)
}

/// Verify a token, then test a tenant role and/or permission.
pub fn check(
    manager: &Manager,
    token: &str,
    tenant: &str,
    role: Option<&str>,
    permission: Option<&Permission>,
) -> anyhow::Result<()> {
    if role.is_none() && permission.is_none() {
        bail!("Nothing to check. Pass --role and/or --permission");
    }

    let token = read_token(token)?;
    let claims = manager
        .parse_claims(&token)
        .context("✖ Token verification failed")?;

    if let Some(role) = role {
        if !claims.has_tenant_role(tenant, role) {
            bail!("✖ Subject '{}' does not hold role '{role}' in tenant '{tenant}'", claims.sub);
        }
        println!("✔ Role '{role}' held in tenant '{tenant}'");
    }

    if let Some(permission) = permission {
        if !claims.has_tenant_permission(tenant, permission) {
            bail!(
                "✖ Subject '{}' lacks permission '{permission}' in tenant '{tenant}'",
                claims.sub
            );
        }
        println!("✔ Permission '{permission}' granted in tenant '{tenant}'");
    }

    Ok(())
}
