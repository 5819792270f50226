//! Shared-token validation.
//!
//! Both sides are reduced to SHA-256 digests before the comparison so the
//! constant-time check always runs over 32 bytes, whatever the caller sent.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Result of checking the token presented by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    /// No token header on the request.
    Missing,
    /// A token was sent but does not match.
    Invalid,
    /// The token matches the configured one.
    Valid,
}

impl CredentialCheck {
    /// Message recorded for a rejected request, `None` when valid.
    pub fn rejection(self) -> Option<&'static str> {
        match self {
            CredentialCheck::Missing => Some("token header missing"),
            CredentialCheck::Invalid => Some("invalid token"),
            CredentialCheck::Valid => None,
        }
    }
}

/// Compare `supplied` against `configured` without leaking the position of
/// the first differing byte or the configured length.
pub fn validate(supplied: &[u8], configured: &[u8]) -> bool {
    let supplied = Sha256::digest(supplied);
    let configured = Sha256::digest(configured);
    bool::from(supplied.as_slice().ct_eq(configured.as_slice()))
}

/// Classify an optional header value against the configured token.
pub fn check_token(supplied: Option<&[u8]>, configured: &[u8]) -> CredentialCheck {
    match supplied {
        None => CredentialCheck::Missing,
        Some(token) if validate(token, configured) => CredentialCheck::Valid,
        Some(_) => CredentialCheck::Invalid,
    }
}
