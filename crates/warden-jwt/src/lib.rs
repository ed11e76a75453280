//! # warden-jwt
//!
//! Stateless, tenant-scoped authorization tokens for Warden.
//!
//! This crate provides functionality for:
//! - Issuing signed JWTs for a subject with per-tenant roles and permissions
//! - Verifying tokens (HMAC signature, expiry) and decoding their claims
//! - Answering role and permission questions about a parsed token
//!
//! ## Token Kinds
//!
//! | Kind | Default TTL | Typical use |
//! |------|-------------|-------------|
//! | **access** | 15 minutes | Presented on every request |
//! | **refresh** | 7 days | Exchanged for new access tokens |
//! | **purpose** | 30 minutes | One-off flows (email verification, password reset) |
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//! use warden_jwt::{Config, Manager, Permission, Tenant};
//!
//! let manager = Manager::new(Config::new("an-example-secret-of-32-bytes!!!").with_issuer("ose"))?;
//!
//! let mut tenants = HashMap::new();
//! tenants.insert(
//!     "owner".to_string(),
//!     Tenant::new("owner", "admin").with_permission(Permission::new("create", "campaign")),
//! );
//!
//! let issued = manager.issue_access_token("user-1", tenants, None)?;
//! let claims = manager.parse_claims(&issued.token)?;
//!
//! assert!(claims.has_tenant_role("owner", "admin"));
//! assert!(claims.has_tenant_permission("owner", &Permission::new("create", "campaign")));
//! # Ok::<(), warden_jwt::TokenError>(())
//! ```

pub mod authz;
pub mod claims;
pub mod config;
pub mod duration;
pub mod error;
pub mod manager;
pub mod signer;

pub use authz::{has_tenant_permission, has_tenant_role};
pub use claims::{Claims, RegisteredClaims, Tenant, TokenKind, UnknownTokenKind};
pub use config::{Config, ConfigError};
pub use error::TokenError;
pub use manager::{ExtraClaims, IssuedToken, Manager};
pub use signer::{HmacSigner, decode_unverified};
pub use warden_core::{IdGenerator, Permission, RidGenerator};
