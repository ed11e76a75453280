//! # warden-core
//!
//! Types shared by every Warden crate.
//!
//! - [`Permission`]: an `action` on a `resource`, granted inside a tenant.
//! - [`IdGenerator`]: the seam used to mint unique token identifiers, with
//!   [`RidGenerator`] as the default implementation.

pub mod id;
pub mod permission;

pub use id::{IdGenerator, RidGenerator};
pub use permission::{ParsePermissionError, Permission};
