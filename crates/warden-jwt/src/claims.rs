//! Token claims: subject, kind and per-tenant authorization grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use warden_core::Permission;

use crate::authz;

/// Category of a token. Each kind has its own default lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token presented on every request.
    Access,
    /// Long-lived token exchanged for new access tokens.
    Refresh,
    /// Single-purpose token (e.g. email verification, password reset).
    Purpose,
}

impl TokenKind {
    /// All token kinds.
    pub const ALL: [TokenKind; 3] = [TokenKind::Access, TokenKind::Refresh, TokenKind::Purpose];

    /// Wire representation used in the `typ` claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::Purpose => "purpose",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown token kind.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown token kind '{0}', expected access, refresh or purpose")]
pub struct UnknownTokenKind(pub String);

impl FromStr for TokenKind {
    type Err = UnknownTokenKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTokenKind(s.to_string()))
    }
}

/// Role and permissions granted to a subject inside one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Role held in the tenant (e.g. "admin").
    pub role: String,

    /// Tenant identifier. By convention equal to the key in [`Claims::tenants`].
    pub tenant: String,

    /// Fine-grained grants. `null` on the wire reads as empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub permissions: Vec<Permission>,
}

impl Tenant {
    /// Create a grant of `role` in `tenant` with no permissions.
    pub fn new(tenant: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            tenant: tenant.into(),
            permissions: Vec::new(),
        }
    }

    /// Add a permission.
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    /// Check if any permission matches on both action and resource.
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions
            .iter()
            .any(|p| p.allows(&permission.action, &permission.resource))
    }
}

/// Registered JWT claims a verifier needs to read.
///
/// None of these fail: they return the stored value or an unset sentinel.
pub trait RegisteredClaims {
    /// The `exp` claim.
    fn expiration_time(&self) -> Option<DateTime<Utc>>;

    /// The `iat` claim.
    fn issued_at(&self) -> Option<DateTime<Utc>>;

    /// The `nbf` claim.
    fn not_before(&self) -> Option<DateTime<Utc>>;

    /// The `iss` claim, empty when unset.
    fn issuer(&self) -> &str;

    /// The `sub` claim.
    fn subject(&self) -> &str;

    /// The `aud` claim, empty when unset.
    fn audience(&self) -> &[String];
}

/// Payload of a Warden token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    #[serde(default)]
    pub sub: String,

    /// Token kind.
    #[serde(rename = "typ")]
    pub kind: TokenKind,

    /// Grants keyed by tenant id.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub tenants: HashMap<String, Tenant>,

    /// Unique token id.
    #[serde(default)]
    pub jti: String,

    /// Expiry, whole seconds.
    #[serde(
        rename = "exp",
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,

    /// Issuance time, whole seconds.
    #[serde(
        rename = "iat",
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub issued_at: Option<DateTime<Utc>>,

    /// Issuer.
    #[serde(rename = "iss", default, skip_serializing_if = "String::is_empty")]
    pub issuer: String,

    /// Audience. Not set by issuance; accepted as a string or a list when decoding.
    #[serde(
        rename = "aud",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub audience: Vec<String>,
}

impl Claims {
    /// Look up the grant for `tenant_id`.
    pub fn tenant(&self, tenant_id: &str) -> Option<&Tenant> {
        self.tenants.get(tenant_id)
    }

    /// See [`authz::has_tenant_role`].
    pub fn has_tenant_role(&self, tenant_id: &str, role: &str) -> bool {
        authz::has_tenant_role(self, tenant_id, role)
    }

    /// See [`authz::has_tenant_permission`].
    pub fn has_tenant_permission(&self, tenant_id: &str, permission: &Permission) -> bool {
        authz::has_tenant_permission(self, tenant_id, permission)
    }

    /// Check if the token has expired (`exp` at or before now). Tokens without
    /// `exp` never expire here.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }

    /// Get time until expiration, `None` when unset or already expired.
    pub fn time_until_expiration(&self) -> Option<chrono::Duration> {
        self.expires_at
            .map(|exp| exp - Utc::now())
            .filter(|remaining| *remaining > chrono::Duration::zero())
    }
}

impl RegisteredClaims for Claims {
    fn expiration_time(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    fn not_before(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn subject(&self) -> &str {
        &self.sub
    }

    fn audience(&self) -> &[String] {
        &self.audience
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::One(aud)) => vec![aud],
        Some(Raw::Many(aud)) => aud,
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn owner_claims() -> Claims {
        let mut tenants = HashMap::new();
        tenants.insert(
            "owner".to_string(),
            Tenant::new("owner", "admin")
                .with_permission(Permission::new("create", "campaign"))
                .with_permission(Permission::new("read", "campaign")),
        );

        Claims {
            sub: "me".to_string(),
            kind: TokenKind::Access,
            tenants,
            jti: "jwt-1".to_string(),
            expires_at: DateTime::from_timestamp(1_756_604_137 + 900, 0),
            issued_at: DateTime::from_timestamp(1_756_604_137, 0),
            issuer: "ose".to_string(),
            audience: Vec::new(),
        }
    }

    #[test]
    fn test_token_kind_strings() {
        for kind in TokenKind::ALL {
            assert_eq!(kind.as_str().parse::<TokenKind>().unwrap(), kind);
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
        assert_eq!("Refresh".parse::<TokenKind>().unwrap(), TokenKind::Refresh);
        assert!("session".parse::<TokenKind>().is_err());
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(owner_claims()).unwrap();

        assert_eq!(value["sub"], "me");
        assert_eq!(value["typ"], "access");
        assert_eq!(value["jti"], "jwt-1");
        assert_eq!(value["iat"], 1_756_604_137);
        assert_eq!(value["exp"], 1_756_604_137 + 900);
        assert_eq!(value["iss"], "ose");
        assert_eq!(value["tenants"]["owner"]["role"], "admin");
        assert_eq!(value["tenants"]["owner"]["tenant"], "owner");
        assert_eq!(
            value["tenants"]["owner"]["permissions"][0],
            json!({ "resource": "campaign", "action": "create" })
        );
        assert!(value.get("aud").is_none());
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let claims = Claims {
            tenants: HashMap::new(),
            issuer: String::new(),
            expires_at: None,
            issued_at: None,
            ..owner_claims()
        };
        let value = serde_json::to_value(claims).unwrap();
        let object = value.as_object().unwrap();

        for key in ["tenants", "iss", "aud", "exp", "iat"] {
            assert!(!object.contains_key(key), "{key} should be omitted");
        }
    }

    #[test]
    fn test_lenient_decoding() {
        let claims: Claims = serde_json::from_value(json!({
            "sub": "me",
            "typ": "purpose",
            "tenants": {
                "t1": { "role": "member", "tenant": "t1", "permissions": null }
            },
            "aud": "api"
        }))
        .unwrap();

        assert_eq!(claims.kind, TokenKind::Purpose);
        assert!(claims.tenants["t1"].permissions.is_empty());
        assert_eq!(claims.audience, vec!["api".to_string()]);
        assert!(claims.jti.is_empty());
        assert!(claims.expires_at.is_none());

        let claims: Claims = serde_json::from_value(json!({
            "typ": "access",
            "tenants": null,
            "aud": ["a", "b"]
        }))
        .unwrap();
        assert!(claims.tenants.is_empty());
        assert_eq!(claims.audience.len(), 2);
    }

    #[test]
    fn test_registered_claims() {
        let claims = owner_claims();

        assert_eq!(claims.subject(), "me");
        assert_eq!(RegisteredClaims::issuer(&claims), "ose");
        assert_eq!(
            claims.expiration_time().unwrap().timestamp(),
            1_756_604_137 + 900
        );
        assert_eq!(
            RegisteredClaims::issued_at(&claims).unwrap().timestamp(),
            1_756_604_137
        );
        assert!(claims.not_before().is_none());
        assert!(RegisteredClaims::audience(&claims).is_empty());
    }

    #[test]
    fn test_expiration_helpers() {
        let expired = owner_claims();
        assert!(expired.is_expired());
        assert!(expired.time_until_expiration().is_none());

        let fresh = Claims {
            expires_at: Some(Utc::now() + chrono::Duration::minutes(5)),
            ..owner_claims()
        };
        assert!(!fresh.is_expired());
        assert!(fresh.time_until_expiration().is_some());

        let unbounded = Claims {
            expires_at: None,
            ..owner_claims()
        };
        assert!(!unbounded.is_expired());
    }

    #[test]
    fn test_tenant_lookup() {
        let claims = owner_claims();
        assert_eq!(claims.tenant("owner").unwrap().role, "admin");
        assert!(claims.tenant("missing").is_none());
        assert!(
            claims
                .tenant("owner")
                .unwrap()
                .has_permission(&Permission::new("read", "campaign"))
        );
    }
}
