use chrono::{Duration, Utc};
use jsonwebtoken::{Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{AuthConfig, AuthError};

/// Payload of a platform-issued session token.
///
/// The wallet address may appear at any of several claim locations; the
/// claim shape changed across deployments and old tokens stay valid until
/// they expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_metadata: Option<Value>,
    pub exp: usize,
    pub iat: usize,
}

/// Ordered wallet-address extraction strategies. First present value wins;
/// new claim locations are appended here, nothing else changes.
const WALLET_CLAIM_STRATEGIES: &[fn(&SessionClaims) -> Option<&str>] = &[
    |claims| claims.wallet_address.as_deref(),
    |claims| metadata_address(claims.user_metadata.as_ref()),
    |claims| metadata_address(claims.app_metadata.as_ref()),
];

fn metadata_address(metadata: Option<&Value>) -> Option<&str> {
    metadata?.get("wallet_address")?.as_str()
}

/// Extract the wallet address embedded in a session token, if any. A blank
/// value at one location does not shadow a real value at the next.
pub fn wallet_claim(claims: &SessionClaims) -> Option<&str> {
    WALLET_CLAIM_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(claims).map(str::trim).filter(|addr| !addr.is_empty()))
}

pub fn issue_session_token(claims: &SessionClaims, config: &AuthConfig) -> Result<String, AuthError> {
    jsonwebtoken::encode(&Header::default(), claims, &config.encoding_key())
        .map_err(|_| AuthError::MalformedToken)
}

pub fn decode_session_token(token: &str, config: &AuthConfig) -> Result<SessionClaims, AuthError> {
    jsonwebtoken::decode::<SessionClaims>(token, &config.decoding_key(), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AuthError::MalformedToken)
}

impl SessionClaims {
    pub fn for_user(user_id: Uuid, config: &AuthConfig) -> Self {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
            .unwrap_or(now)
            .timestamp() as usize;
        Self {
            sub: user_id,
            email: None,
            role: None,
            wallet_address: None,
            user_metadata: None,
            app_metadata: None,
            exp,
            iat: now.timestamp() as usize,
        }
    }
}
