//! Error types for token operations.

use jsonwebtoken::Algorithm;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use thiserror::Error;

/// Errors that can occur while building a manager, issuing or parsing tokens.
///
/// Callers authorizing a request should treat every verification error the
/// same way (reject) and not branch on the specific variant.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The signing secret is empty.
    #[error("signing secret is required")]
    MissingSecret,

    /// The configured algorithm is not in the HMAC family.
    #[error("unsupported signing algorithm: {0:?}")]
    UnsupportedAlgorithm(Algorithm),

    /// The requested TTL moves the expiry outside the representable range.
    #[error("token ttl is out of range")]
    TtlOutOfRange,

    /// Signing the claim set failed.
    #[error("failed to sign token: {0}")]
    Signing(#[source] JwtError),

    /// The token header names a non-HMAC algorithm.
    #[error("unexpected signing method: {0:?}")]
    UnexpectedSigningMethod(Algorithm),

    /// The signature does not match the configured secret.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// The token is past its expiry.
    #[error("token has expired")]
    Expired,

    /// The token is structurally or semantically invalid.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token could not be decoded (base64, UTF-8 or JSON).
    #[error("failed to decode token: {0}")]
    Decode(String),
}

impl TokenError {
    /// Whether this error came from checking an inbound token.
    pub fn is_verification(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedSigningMethod(_)
                | Self::InvalidSignature
                | Self::Expired
                | Self::InvalidToken(_)
                | Self::Decode(_)
        )
    }

    /// Whether this error came from the manager's configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingSecret | Self::UnsupportedAlgorithm(_) | Self::TtlOutOfRange
        )
    }
}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                Self::Decode(err.to_string())
            }
            _ => Self::InvalidToken(err.to_string()),
        }
    }
}
