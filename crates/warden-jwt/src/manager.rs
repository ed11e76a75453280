//! Token issuance and parsing.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::Algorithm;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use warden_core::{IdGenerator, RidGenerator};

use crate::claims::{Claims, Tenant, TokenKind};
use crate::config::{
    Config, DEFAULT_ACCESS_TTL_SECS, DEFAULT_PREFIX, DEFAULT_PURPOSE_TTL_SECS,
    DEFAULT_REFRESH_TTL_SECS,
};
use crate::error::TokenError;
use crate::signer::HmacSigner;

/// Secrets shorter than this still work but are logged as weak.
pub const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

/// Additional top-level claims merged into a token payload.
pub type ExtraClaims = serde_json::Map<String, Value>;

/// Result of an issue call: the compact token and the claims it was built from.
///
/// When extra claims were supplied the signed payload is the flattened claim
/// set, so `claims` may not match the wire content bit for bit.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded, signed token.
    pub token: String,
    /// Structured claims.
    pub claims: Claims,
}

/// Issues and parses tenant-scoped tokens with a single HMAC secret.
///
/// A manager is immutable once built and cheap to clone; share one instance
/// across threads instead of rebuilding it per request.
#[derive(Clone)]
pub struct Manager {
    prefix: String,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    purpose_ttl: Duration,
    signer: Arc<HmacSigner>,
    ids: Arc<dyn IdGenerator>,
}

fn default_duration(ttl: Duration, fallback_secs: i64) -> Duration {
    if ttl <= Duration::zero() {
        Duration::seconds(fallback_secs)
    } else {
        ttl
    }
}

impl Manager {
    /// Build a manager, filling unset prefix and TTLs with defaults.
    ///
    /// Fails when the secret is empty or the algorithm is not HMAC.
    pub fn new(config: Config) -> Result<Self, TokenError> {
        Self::with_id_generator(config, Arc::new(RidGenerator::default()))
    }

    /// Build a manager that mints token ids with `ids`.
    pub fn with_id_generator(
        config: Config,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, TokenError> {
        if config.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        if config.secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                "JWT secret is shorter than recommended ({} bytes)",
                MIN_RECOMMENDED_SECRET_LEN
            );
        }

        let signer = HmacSigner::new(config.secret.as_bytes(), config.algorithm)?;

        let prefix = if config.prefix.is_empty() {
            DEFAULT_PREFIX.to_string()
        } else {
            config.prefix
        };

        Ok(Self {
            prefix,
            issuer: config.issuer,
            access_ttl: default_duration(config.access_ttl, DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl: default_duration(config.refresh_ttl, DEFAULT_REFRESH_TTL_SECS),
            purpose_ttl: default_duration(config.purpose_ttl, DEFAULT_PURPOSE_TTL_SECS),
            signer: Arc::new(signer),
            ids,
        })
    }

    /// Issuer written into every token.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Prefix used for token ids.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Signing algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.signer.algorithm()
    }

    /// Resolved lifetime for tokens of `kind`.
    pub fn ttl_for(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
            TokenKind::Purpose => self.purpose_ttl,
        }
    }

    fn issue(
        &self,
        subject: &str,
        kind: TokenKind,
        tenants: HashMap<String, Tenant>,
        ttl: Duration,
        extra: Option<&ExtraClaims>,
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now().trunc_subsecs(0);
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(TokenError::TtlOutOfRange)?;

        let claims = Claims {
            sub: subject.to_string(),
            kind,
            tenants,
            jti: self.ids.generate(&self.prefix),
            expires_at: Some(expires_at),
            issued_at: Some(now),
            issuer: self.issuer.clone(),
            audience: Vec::new(),
        };

        let token = match extra {
            None => self.signer.sign(&claims)?,
            Some(extra) => {
                if !claims.tenants.is_empty() && !extra.contains_key("tenants") {
                    tracing::warn!(
                        sub = %claims.sub,
                        jti = %claims.jti,
                        "tenant grants are not embedded in tokens issued with extra claims"
                    );
                }
                self.signer
                    .sign(&flattened_claims(&claims, now, expires_at, extra))?
            }
        };

        tracing::debug!(
            sub = %claims.sub,
            kind = %claims.kind,
            jti = %claims.jti,
            exp = expires_at.timestamp(),
            "issued token"
        );

        Ok(IssuedToken { token, claims })
    }

    /// Issue an access token with the configured access TTL.
    pub fn issue_access_token(
        &self,
        subject: &str,
        tenants: HashMap<String, Tenant>,
        extra: Option<&ExtraClaims>,
    ) -> Result<IssuedToken, TokenError> {
        self.issue(subject, TokenKind::Access, tenants, self.access_ttl, extra)
    }

    /// Issue a refresh token with the configured refresh TTL.
    pub fn issue_refresh_token(
        &self,
        subject: &str,
        tenants: HashMap<String, Tenant>,
        extra: Option<&ExtraClaims>,
    ) -> Result<IssuedToken, TokenError> {
        self.issue(subject, TokenKind::Refresh, tenants, self.refresh_ttl, extra)
    }

    /// Issue a purpose token with the configured purpose TTL.
    pub fn issue_purpose_token(
        &self,
        subject: &str,
        tenants: HashMap<String, Tenant>,
        extra: Option<&ExtraClaims>,
    ) -> Result<IssuedToken, TokenError> {
        self.issue(subject, TokenKind::Purpose, tenants, self.purpose_ttl, extra)
    }

    /// Issue a token of any kind with an explicit TTL. Returns the token only.
    ///
    /// The TTL is used as given; a negative value yields an already expired token.
    pub fn issue_token(
        &self,
        subject: &str,
        kind: TokenKind,
        tenants: HashMap<String, Tenant>,
        extra: Option<&ExtraClaims>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.issue(subject, kind, tenants, ttl, extra)
            .map(|issued| issued.token)
    }

    /// Verify `token` and return its claims.
    ///
    /// Rejects non-HMAC headers, bad signatures, expired tokens (`exp` at or
    /// before now) and malformed payloads. `nbf` is ignored.
    pub fn parse_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let claims: Claims = self.signer.verify(token).inspect_err(|e| {
            tracing::debug!(error = %e, "token verification failed");
        })?;

        tracing::debug!(sub = %claims.sub, kind = %claims.kind, jti = %claims.jti, "verified token");
        Ok(claims)
    }

    /// Decode `token` without verifying its signature or lifetime.
    ///
    /// Only for peeking at claims; never authorize anything from the result.
    pub fn parse_claims_unsafe(&self, token: &str) -> Result<Claims, TokenError> {
        self.signer.decode_unverified(token)
    }
}

/// The six registered fields, then every extra entry (extra wins on collision).
fn flattened_claims(
    claims: &Claims,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    extra: &ExtraClaims,
) -> ExtraClaims {
    let mut map = ExtraClaims::new();
    map.insert("sub".to_string(), Value::from(claims.sub.as_str()));
    map.insert("typ".to_string(), Value::from(claims.kind.as_str()));
    map.insert("jti".to_string(), Value::from(claims.jti.as_str()));
    map.insert("iss".to_string(), Value::from(claims.issuer.as_str()));
    map.insert("iat".to_string(), Value::from(issued_at.timestamp()));
    map.insert("exp".to_string(), Value::from(expires_at.timestamp()));

    for (key, value) in extra {
        map.insert(key.clone(), value.clone());
    }
    map
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("prefix", &self.prefix)
            .field("issuer", &self.issuer)
            .field("algorithm", &self.signer.algorithm())
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("purpose_ttl", &self.purpose_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> Manager {
        Manager::new(Config::new("test-secret-key-that-is-long-enough-for-testing")).unwrap()
    }

    #[test]
    fn test_defaults_are_applied() {
        let manager = manager();
        assert_eq!(manager.prefix(), "jwt");
        assert_eq!(manager.issuer(), "");
        assert_eq!(manager.algorithm(), Algorithm::HS256);
        assert_eq!(manager.ttl_for(TokenKind::Access), Duration::minutes(15));
        assert_eq!(manager.ttl_for(TokenKind::Refresh), Duration::days(7));
        assert_eq!(manager.ttl_for(TokenKind::Purpose), Duration::minutes(30));
    }

    #[test]
    fn test_defaults_apply_per_field() {
        let config = Config::new("secret")
            .with_prefix("FMC")
            .with_access_ttl(Duration::minutes(-5))
            .with_refresh_ttl(Duration::hours(1));
        let manager = Manager::new(config).unwrap();

        assert_eq!(manager.prefix(), "FMC");
        assert_eq!(manager.ttl_for(TokenKind::Access), Duration::minutes(15));
        assert_eq!(manager.ttl_for(TokenKind::Refresh), Duration::hours(1));
        assert_eq!(manager.ttl_for(TokenKind::Purpose), Duration::minutes(30));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let err = Manager::new(Config::default()).unwrap_err();
        assert!(matches!(err, TokenError::MissingSecret));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_non_hmac_algorithm_is_rejected() {
        let err = Manager::new(Config::new("secret").with_algorithm(Algorithm::ES256)).unwrap_err();
        assert!(matches!(err, TokenError::UnsupportedAlgorithm(Algorithm::ES256)));
    }

    #[test]
    fn test_flattened_claims_order_of_precedence() {
        let issued = manager()
            .issue_access_token("me", HashMap::new(), None)
            .unwrap();
        let claims = issued.claims;
        let (iat, exp) = (claims.issued_at.unwrap(), claims.expires_at.unwrap());

        let mut extra = ExtraClaims::new();
        extra.insert("sub".to_string(), Value::from("someone-else"));
        extra.insert("foo".to_string(), Value::from("bar"));

        let map = flattened_claims(&claims, iat, exp, &extra);
        assert_eq!(map["sub"], "someone-else");
        assert_eq!(map["foo"], "bar");
        assert_eq!(map["typ"], "access");
        assert_eq!(map["iat"], iat.timestamp());
        assert_eq!(map["exp"], exp.timestamp());
        assert!(!map.contains_key("tenants"));
    }

    #[test]
    fn test_ttl_overflow_is_an_error() {
        let err = manager()
            .issue_token(
                "me",
                TokenKind::Access,
                HashMap::new(),
                None,
                Duration::days(365 * 300_000),
            )
            .unwrap_err();
        assert!(matches!(err, TokenError::TtlOutOfRange));
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", manager());
        assert!(debug.contains("Manager"));
        assert!(!debug.contains("test-secret-key"));
    }

    #[test]
    fn test_manager_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Manager>();
    }
}
