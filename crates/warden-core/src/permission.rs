//! Fine-grained permissions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single grant: `action` may be performed on `resource`.
///
/// Two permissions are equal when both fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// The thing being acted upon (e.g. "campaign").
    pub resource: String,

    /// The verb (e.g. "create", "read").
    pub action: String,
}

impl Permission {
    /// Create a permission for `action` on `resource`.
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Check whether this permission grants `action` on `resource`.
    pub fn allows(&self, action: &str, resource: &str) -> bool {
        self.action == action && self.resource == resource
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.resource)
    }
}

/// Error returned when a permission string is not `action:resource`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid permission '{0}', expected 'action:resource'")]
pub struct ParsePermissionError(pub String);

impl FromStr for Permission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((action, resource)) if !action.is_empty() && !resource.is_empty() => {
                Ok(Self::new(action.trim(), resource.trim()))
            }
            _ => Err(ParsePermissionError(s.to_string())),
        }
    }
}
