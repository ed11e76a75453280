//! HMAC signing and verification of compact JWTs.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

use crate::error::TokenError;

/// Algorithms accepted when verifying a token.
pub const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Whether `algorithm` belongs to the HMAC family.
pub fn is_hmac(algorithm: Algorithm) -> bool {
    HMAC_ALGORITHMS.contains(&algorithm)
}

/// Signs claim sets with a shared secret and verifies them on the way back.
#[derive(Clone)]
pub struct HmacSigner {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl HmacSigner {
    /// Create a signer for `secret` using one of the HMAC algorithms.
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        if !is_hmac(algorithm) {
            return Err(TokenError::UnsupportedAlgorithm(algorithm));
        }

        // Any HMAC variant verifies against the same secret. A token is
        // expired from the second named by `exp` onwards; `nbf` is not used.
        let mut validation = Validation::new(algorithm);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.reject_tokens_expiring_in_less_than = 1;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// The algorithm written into the header of signed tokens.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Serialize and sign `claims`, returning the compact token.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Verify the signature and time bounds of `token` and decode its claims.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let header = decode_header(token)?;
        if !is_hmac(header.alg) {
            return Err(TokenError::UnexpectedSigningMethod(header.alg));
        }

        let data = decode::<T>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Decode the claims of `token` without checking signature or time bounds.
    pub fn decode_unverified<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        decode_unverified(token)
    }
}

/// Decode the claims of `token` without a key, skipping signature and time checks.
///
/// Fails only when the token is not a well-formed JWT or the payload does not
/// match `T`.
pub fn decode_unverified<T: DeserializeOwned>(token: &str) -> Result<T, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<T>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
