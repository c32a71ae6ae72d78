use chrono::{Duration, Utc};
use jsonwebtoken::{Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{AuthConfig, AuthError};

/// A normalized wallet address. Hex (`0x…`) addresses compare
/// case-insensitively; other encodings compare verbatim.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AuthError::MalformedToken);
        }
        let normalized = if trimmed.len() > 2 && trimmed[..2].eq_ignore_ascii_case("0x") {
            trimmed.to_ascii_lowercase()
        } else {
            trimmed.to_string()
        };
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recognized wallet-proof token shapes. A token matching none of these is
/// rejected before any verifier runs; address-only matching was a replay
/// vector in an earlier design and is not an accepted fallback.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WalletTokenShape {
    /// Compact JWT minted by the auth platform at wallet-connect time.
    Jwt,
    /// Legacy `wsig1:<base64>` signed-challenge blob.
    SignedChallenge,
}

#[derive(Clone, Debug)]
pub struct ParsedWalletToken {
    pub shape: WalletTokenShape,
    pub raw: String,
}

const SIGNED_CHALLENGE_PREFIX: &str = "wsig1:";

fn is_base64url(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '=')
}

/// Classify a raw token against the shape allow-list.
pub fn classify_token(raw: &str) -> Option<WalletTokenShape> {
    let trimmed = raw.trim();
    if let Some(body) = trimmed.strip_prefix(SIGNED_CHALLENGE_PREFIX) {
        return is_base64url(body).then_some(WalletTokenShape::SignedChallenge);
    }
    let segments: Vec<&str> = trimmed.split('.').collect();
    if segments.len() == 3 && segments.iter().all(|s| is_base64url(s)) {
        return Some(WalletTokenShape::Jwt);
    }
    None
}

impl ParsedWalletToken {
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let shape = classify_token(raw).ok_or(AuthError::MalformedToken)?;
        Ok(Self {
            shape,
            raw: raw.trim().to_string(),
        })
    }
}

/// Proof check for a shape-validated wallet token. Deployments plug in the
/// verifier matching their wallet-connect flow; tests use fakes.
pub trait WalletVerifier: Send + Sync {
    /// Whether `token` proves control of `address`.
    fn verify(&self, address: &WalletAddress, token: &ParsedWalletToken) -> Result<bool, AuthError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WalletProofClaims {
    address: String,
    exp: usize,
    iat: usize,
}

/// Verifies [`WalletTokenShape::Jwt`] proofs: an HS256 token whose `address`
/// claim must match the supplied header address. Legacy signed-challenge
/// blobs are not accepted by this verifier.
pub struct HsJwtWalletVerifier {
    config: AuthConfig,
}

impl HsJwtWalletVerifier {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }
}

impl WalletVerifier for HsJwtWalletVerifier {
    fn verify(&self, address: &WalletAddress, token: &ParsedWalletToken) -> Result<bool, AuthError> {
        if token.shape != WalletTokenShape::Jwt {
            return Ok(false);
        }
        let decoded = jsonwebtoken::decode::<WalletProofClaims>(
            &token.raw,
            &self.config.decoding_key(),
            &Validation::default(),
        )
        .map_err(|_| AuthError::MalformedToken)?;
        let claimed = WalletAddress::parse(&decoded.claims.address)?;
        Ok(claimed == *address)
    }
}

/// Mint a wallet-proof token for `address`. Used by the seed command and by
/// tests; production proofs come from the wallet-connect flow.
pub fn issue_wallet_proof(address: &WalletAddress, config: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = WalletProofClaims {
        address: address.as_str().to_string(),
        exp,
        iat: now.timestamp() as usize,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
        .map_err(|_| AuthError::MalformedToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_addresses_compare_case_insensitively() {
        let a = WalletAddress::parse("0xAbC123").unwrap();
        let b = WalletAddress::parse("0xabc123").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn non_hex_addresses_compare_verbatim() {
        let a = WalletAddress::parse("So1anaAddr").unwrap();
        let b = WalletAddress::parse("so1anaaddr").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn blank_address_is_rejected() {
        assert!(WalletAddress::parse("   ").is_err());
    }

    #[test]
    fn jwt_shape_is_recognized() {
        assert_eq!(classify_token("aaa.bbb.ccc"), Some(WalletTokenShape::Jwt));
    }

    #[test]
    fn signed_challenge_shape_is_recognized() {
        assert_eq!(
            classify_token("wsig1:c2lnbmVkLWNoYWxsZW5nZQ=="),
            Some(WalletTokenShape::SignedChallenge)
        );
    }

    #[test]
    fn unknown_shapes_are_rejected_outright() {
        assert_eq!(classify_token("just-a-string"), None);
        assert_eq!(classify_token("aaa.bbb"), None);
        assert_eq!(classify_token("wsig1:"), None);
        assert_eq!(classify_token(""), None);
    }

    #[test]
    fn jwt_proof_verifies_matching_address_only() {
        let config = AuthConfig::new("secret", 60);
        let address = WalletAddress::parse("0xAddr123").unwrap();
        let raw = issue_wallet_proof(&address, &config).unwrap();
        let token = ParsedWalletToken::parse(&raw).unwrap();
        let verifier = HsJwtWalletVerifier::new(config);

        assert!(verifier.verify(&address, &token).unwrap());
        let other = WalletAddress::parse("0xAddr999").unwrap();
        assert!(!verifier.verify(&other, &token).unwrap());
    }

    #[test]
    fn jwt_proof_with_wrong_secret_is_malformed() {
        let address = WalletAddress::parse("0xAddr123").unwrap();
        let raw = issue_wallet_proof(&address, &AuthConfig::new("secret", 60)).unwrap();
        let token = ParsedWalletToken::parse(&raw).unwrap();
        let verifier = HsJwtWalletVerifier::new(AuthConfig::new("other", 60));
        assert!(verifier.verify(&address, &token).is_err());
    }

    #[test]
    fn signed_challenge_is_not_accepted_by_jwt_verifier() {
        let config = AuthConfig::new("secret", 60);
        let address = WalletAddress::parse("0xAddr123").unwrap();
        let token = ParsedWalletToken::parse("wsig1:cHJvb2Y=").unwrap();
        let verifier = HsJwtWalletVerifier::new(config);
        assert!(!verifier.verify(&address, &token).unwrap());
    }
}
