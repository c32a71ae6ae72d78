use platform_authn::{AdminDirectory, Principal, Role};
use tracing::warn;

use crate::GrantStore;

/// Maps a resolved principal to its coarse role.
///
/// Administrator status comes from the configured directory, never from a
/// stored role row. Merchant status comes from the stored role attribute or
/// from owning at least one collection. Wallet-only and anonymous
/// principals are plain users.
pub struct RoleClassifier {
    admins: AdminDirectory,
}

impl RoleClassifier {
    pub fn new(admins: AdminDirectory) -> Self {
        Self { admins }
    }

    pub async fn classify(&self, principal: &Principal, grants: &dyn GrantStore) -> Role {
        if principal.role == Role::Admin
            || self
                .admins
                .matches(principal.user_id, principal.email.as_deref())
        {
            return Role::Admin;
        }
        if principal.role == Role::Merchant {
            return Role::Merchant;
        }
        if let Some(user_id) = principal.user_id {
            match grants.owns_any(user_id).await {
                Ok(true) => return Role::Merchant,
                Ok(false) => {}
                Err(err) => {
                    // Classification failure degrades privilege, never raises it.
                    warn!(%user_id, error = %err, "ownership lookup failed during role classification");
                }
            }
        }
        Role::User
    }
}
