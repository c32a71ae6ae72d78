//! Dual-channel identity resolution.
//!
//! A caller proves who they are through either of two channels: a
//! platform-issued session token, or a wallet header pair (address plus an
//! out-of-band proof token). Both may be present on the same request; the
//! resolver merges them into a single [`Principal`] or rejects the request
//! when the channels disagree.

mod claims;
mod principal;
mod resolver;
mod wallet;

use jsonwebtoken::{DecodingKey, EncodingKey};
use thiserror::Error;

pub use claims::{SessionClaims, decode_session_token, issue_session_token, wallet_claim};
pub use principal::{AdminDirectory, Principal, PrincipalKind, Role};
pub use resolver::{CredentialBundle, IdentityResolver, WalletHeaders};
pub use wallet::{
    HsJwtWalletVerifier, ParsedWalletToken, WalletAddress, WalletTokenShape, WalletVerifier,
    issue_wallet_proof,
};

#[derive(Debug, Error)]
pub enum AuthError {
    /// No identity could be resolved where one was required. An anonymous
    /// public visitor is an ordinary [`Principal`], not this error.
    #[error("no credential supplied")]
    NoCredential,
    /// A session or wallet token had a shape or signature that is not
    /// recognized. Never treated as ambiguously valid.
    #[error("malformed credential token")]
    MalformedToken,
    /// Two credential channels resolved to different identities.
    #[error("credential channels disagree on identity")]
    ConflictingIdentity,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, session_ttl_minutes: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            session_ttl_minutes,
        }
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl_minutes", &self.session_ttl_minutes)
            .finish()
    }
}
