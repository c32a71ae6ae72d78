//! Validation rules for grant administration.
//!
//! Mutations run these checks explicitly at the service boundary before any
//! row is touched; there are no storage-side hooks. Unlike decision-path
//! failures, these rejections carry detail: they go back to a trusted
//! administrative caller.

use platform_authn::{AdminDirectory, Principal};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum GrantAdminError {
    #[error("only an administrator or the collection owner may manage grants")]
    ActorNotPermitted,
    #[error("cannot grant access to the collection's own owner")]
    GranteeOwnsCollection,
    #[error("cannot modify access of a designated administrator")]
    AdministratorImmutable,
}

/// Validate a grant create or revoke against the collection's recorded
/// owner. `actor` is the caller, `grantee` the account whose access changes.
pub fn validate_grant_change(
    actor: &Principal,
    grantee: Uuid,
    owner: Uuid,
    admins: &AdminDirectory,
) -> Result<(), GrantAdminError> {
    if !actor.is_admin() && actor.user_id != Some(owner) {
        return Err(GrantAdminError::ActorNotPermitted);
    }
    if grantee == owner {
        return Err(GrantAdminError::GranteeOwnsCollection);
    }
    if admins.matches_id(grantee) {
        return Err(GrantAdminError::AdministratorImmutable);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_authn::Role;

    fn merchant(user_id: Uuid) -> Principal {
        Principal::session_user(user_id, None, Role::Merchant)
    }

    fn admin() -> Principal {
        Principal::session_user(Uuid::new_v4(), None, Role::Admin)
    }

    #[test]
    fn owner_may_manage_grants_on_their_collection() {
        let owner = Uuid::new_v4();
        let grantee = Uuid::new_v4();
        let result =
            validate_grant_change(&merchant(owner), grantee, owner, &AdminDirectory::default());
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn strangers_may_not_manage_grants() {
        let owner = Uuid::new_v4();
        let result = validate_grant_change(
            &merchant(Uuid::new_v4()),
            Uuid::new_v4(),
            owner,
            &AdminDirectory::default(),
        );
        assert_eq!(result, Err(GrantAdminError::ActorNotPermitted));
    }

    #[test]
    fn granting_to_the_owner_is_rejected_with_detail() {
        let owner = Uuid::new_v4();
        let result = validate_grant_change(&admin(), owner, owner, &AdminDirectory::default());
        assert_eq!(result, Err(GrantAdminError::GranteeOwnsCollection));
    }

    #[test]
    fn designated_administrators_are_immutable() {
        let owner = Uuid::new_v4();
        let root = Uuid::new_v4();
        let admins = AdminDirectory::new([root], Vec::<String>::new());
        let result = validate_grant_change(&admin(), root, owner, &admins);
        assert_eq!(result, Err(GrantAdminError::AdministratorImmutable));
    }
}
