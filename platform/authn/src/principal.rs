use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::wallet::WalletAddress;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PrincipalKind {
    SessionUser,
    WalletHolder,
    Anonymous,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Role {
    User,
    Merchant,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Merchant => "MERCHANT",
            Role::User => "USER",
        }
    }

    pub fn from_hint(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "MERCHANT" => Some(Role::Merchant),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

/// The resolved caller, constructed once per request and discarded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Principal {
    pub kind: PrincipalKind,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    /// Present only when a credential channel verified it.
    pub wallet_address: Option<WalletAddress>,
    pub role: Role,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            kind: PrincipalKind::Anonymous,
            user_id: None,
            email: None,
            wallet_address: None,
            role: Role::User,
        }
    }

    pub fn session_user(user_id: Uuid, email: Option<String>, role: Role) -> Self {
        Self {
            kind: PrincipalKind::SessionUser,
            user_id: Some(user_id),
            email,
            wallet_address: None,
            role,
        }
    }

    pub fn wallet_holder(address: WalletAddress) -> Self {
        Self {
            kind: PrincipalKind::WalletHolder,
            user_id: None,
            email: None,
            wallet_address: Some(address),
            role: Role::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == PrincipalKind::Anonymous
    }
}

/// Configuration-provided administrator identities. The legacy deployment
/// pinned a single superuser account; email matching remains as a fallback
/// for sessions minted before user ids were stable.
#[derive(Clone, Debug, Default)]
pub struct AdminDirectory {
    ids: HashSet<Uuid>,
    emails: HashSet<String>,
}

impl AdminDirectory {
    pub fn new(ids: impl IntoIterator<Item = Uuid>, emails: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            emails: emails
                .into_iter()
                .map(|e| e.trim().to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Parse comma-separated env values. Malformed ids are skipped rather
    /// than failing startup.
    pub fn from_lists(ids: &str, emails: &str) -> Self {
        let parsed_ids = ids
            .split(',')
            .filter_map(|raw| Uuid::parse_str(raw.trim()).ok());
        let parsed_emails = emails.split(',').map(|raw| raw.to_string());
        Self::new(parsed_ids, parsed_emails)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.emails.is_empty()
    }

    pub fn matches_id(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    pub fn matches_email(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_ascii_lowercase())
    }

    pub fn matches(&self, user_id: Option<Uuid>, email: Option<&str>) -> bool {
        user_id.map(|id| self.matches_id(id)).unwrap_or(false)
            || email.map(|e| self.matches_email(e)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_directory_matches_by_id_or_legacy_email() {
        let id = Uuid::new_v4();
        let dir = AdminDirectory::new([id], ["Root@Example.Com".to_string()]);
        assert!(dir.matches(Some(id), None));
        assert!(dir.matches(None, Some("root@example.com")));
        assert!(!dir.matches(Some(Uuid::new_v4()), Some("other@example.com")));
    }

    #[test]
    fn from_lists_skips_malformed_ids() {
        let id = Uuid::new_v4();
        let dir = AdminDirectory::from_lists(&format!("not-a-uuid, {id}"), " ");
        assert!(dir.matches_id(id));
        assert!(!dir.matches_email(""));
    }

    #[test]
    fn anonymous_principal_has_no_identity() {
        let p = Principal::anonymous();
        assert!(p.is_anonymous());
        assert!(p.user_id.is_none());
        assert!(p.wallet_address.is_none());
        assert_eq!(p.role, Role::User);
    }
}
