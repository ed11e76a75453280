//! Tenant authorization queries over parsed claims.
//!
//! Both helpers are pure reads; a tenant missing from the claims never
//! grants anything.

use warden_core::Permission;

use crate::claims::Claims;

/// Check if the subject holds exactly `role` (case-sensitive) in `tenant_id`.
pub fn has_tenant_role(claims: &Claims, tenant_id: &str, role: &str) -> bool {
    claims
        .tenants
        .get(tenant_id)
        .is_some_and(|tenant| tenant.role == role)
}

/// Check if the subject was granted `permission` in `tenant_id`.
///
/// Matches on both action and resource; the order of grants is irrelevant.
pub fn has_tenant_permission(claims: &Claims, tenant_id: &str, permission: &Permission) -> bool {
    claims
        .tenants
        .get(tenant_id)
        .is_some_and(|tenant| tenant.has_permission(permission))
}
