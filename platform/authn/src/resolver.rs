use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::claims::{decode_session_token, wallet_claim};
use crate::principal::{AdminDirectory, Principal, PrincipalKind, Role};
use crate::wallet::{ParsedWalletToken, WalletAddress, WalletVerifier};
use crate::{AuthConfig, AuthError};

/// Raw credential material pulled off a request by the transport layer.
#[derive(Clone, Debug, Default)]
pub struct CredentialBundle {
    pub session_token: Option<String>,
    pub wallet: Option<WalletHeaders>,
}

#[derive(Clone, Debug)]
pub struct WalletHeaders {
    pub address: String,
    pub token: String,
}

impl CredentialBundle {
    pub fn is_empty(&self) -> bool {
        self.session_token.is_none() && self.wallet.is_none()
    }
}

pub struct IdentityResolver {
    config: AuthConfig,
    admins: AdminDirectory,
    verifier: Arc<dyn WalletVerifier>,
}

struct SessionChannel {
    user_id: Uuid,
    email: Option<String>,
    role_hint: Option<Role>,
    claim_address: Option<WalletAddress>,
}

impl IdentityResolver {
    pub fn new(config: AuthConfig, admins: AdminDirectory, verifier: Arc<dyn WalletVerifier>) -> Self {
        Self {
            config,
            admins,
            verifier,
        }
    }

    /// Resolve a request's credentials into a [`Principal`].
    ///
    /// An empty bundle resolves to the anonymous principal. Errors mean the
    /// caller presented something and it did not hold up.
    pub fn resolve(&self, bundle: &CredentialBundle) -> Result<Principal, AuthError> {
        let session = bundle
            .session_token
            .as_deref()
            .map(|token| self.resolve_session(token))
            .transpose()?;
        let header_address = bundle
            .wallet
            .as_ref()
            .map(|headers| self.resolve_wallet(headers))
            .transpose()?;

        if let (Some(session), Some(verified)) = (&session, &header_address) {
            if let Some(claimed) = &session.claim_address {
                if claimed != verified {
                    warn!(
                        user_id = %session.user_id,
                        "session wallet claim disagrees with verified wallet header"
                    );
                    return Err(AuthError::ConflictingIdentity);
                }
            }
        }

        match (session, header_address) {
            (Some(session), header_address) => {
                let wallet_address = header_address.or(session.claim_address.clone());
                let role = self.session_role(&session);
                Ok(Principal {
                    kind: PrincipalKind::SessionUser,
                    user_id: Some(session.user_id),
                    email: session.email,
                    wallet_address,
                    role,
                })
            }
            (None, Some(address)) => Ok(Principal::wallet_holder(address)),
            (None, None) => Ok(Principal::anonymous()),
        }
    }

    /// Like [`resolve`](Self::resolve), for call sites that cannot proceed
    /// anonymously.
    pub fn resolve_required(&self, bundle: &CredentialBundle) -> Result<Principal, AuthError> {
        if bundle.is_empty() {
            return Err(AuthError::NoCredential);
        }
        self.resolve(bundle)
    }

    fn resolve_session(&self, token: &str) -> Result<SessionChannel, AuthError> {
        let claims = decode_session_token(token, &self.config).map_err(|err| {
            warn!("session token rejected: unrecognized shape or signature");
            err
        })?;
        let claim_address = wallet_claim(&claims)
            .map(WalletAddress::parse)
            .transpose()?;
        Ok(SessionChannel {
            user_id: claims.sub,
            email: claims.email.clone(),
            role_hint: claims.role.as_deref().and_then(Role::from_hint),
            claim_address,
        })
    }

    fn resolve_wallet(&self, headers: &WalletHeaders) -> Result<WalletAddress, AuthError> {
        let address = WalletAddress::parse(&headers.address)?;
        let token = ParsedWalletToken::parse(&headers.token).map_err(|err| {
            warn!(%address, "wallet token rejected: shape not in allow-list");
            err
        })?;
        if !self.verifier.verify(&address, &token)? {
            warn!(%address, "wallet token failed verification");
            return Err(AuthError::MalformedToken);
        }
        Ok(address)
    }

    fn session_role(&self, session: &SessionChannel) -> Role {
        if self
            .admins
            .matches(Some(session.user_id), session.email.as_deref())
        {
            Role::Admin
        } else {
            session.role_hint.unwrap_or(Role::User)
        }
    }
}
