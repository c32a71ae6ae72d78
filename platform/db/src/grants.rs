use chrono::Utc;
use entity::{collection, collection_grant};
use platform_authn::{AdminDirectory, Principal};
use platform_authz::admin::{GrantAdminError, validate_grant_change};
use platform_authz::Level;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, DbErr, EntityTrait};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::catalog::level_to_entity;
use crate::DbPool;

#[derive(Debug, Error)]
pub enum GrantServiceError {
    #[error(transparent)]
    Rejected(#[from] GrantAdminError),
    #[error("collection not found")]
    UnknownCollection,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Grant administration write path. Validation runs before any row changes;
/// the decision engine never calls into this.
pub struct GrantService {
    db: DbPool,
    admins: AdminDirectory,
}

impl GrantService {
    pub fn new(db: DbPool, admins: AdminDirectory) -> Self {
        Self { db, admins }
    }

    pub async fn create_grant(
        &self,
        actor: &Principal,
        collection_id: Uuid,
        grantee: Uuid,
        level: Level,
    ) -> Result<(), GrantServiceError> {
        let owner = self.collection_owner(collection_id).await?;
        validate_grant_change(actor, grantee, owner, &self.admins)?;

        let model = collection_grant::ActiveModel {
            user_id: Set(grantee),
            collection_id: Set(collection_id),
            level: Set(level_to_entity(level)),
            created_at: Set(Utc::now().into()),
        };
        collection_grant::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    collection_grant::Column::UserId,
                    collection_grant::Column::CollectionId,
                ])
                .update_column(collection_grant::Column::Level)
                .to_owned(),
            )
            .exec(&self.db)
            .await?;
        info!(%collection_id, %grantee, level = level.as_str(), "grant recorded");
        Ok(())
    }

    pub async fn revoke_grant(
        &self,
        actor: &Principal,
        collection_id: Uuid,
        grantee: Uuid,
    ) -> Result<bool, GrantServiceError> {
        let owner = self.collection_owner(collection_id).await?;
        validate_grant_change(actor, grantee, owner, &self.admins)?;

        let result = collection_grant::Entity::delete_by_id((grantee, collection_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected > 0 {
            info!(%collection_id, %grantee, "grant revoked");
        }
        Ok(result.rows_affected > 0)
    }

    async fn collection_owner(&self, collection_id: Uuid) -> Result<Uuid, GrantServiceError> {
        collection::Entity::find_by_id(collection_id)
            .one(&self.db)
            .await?
            .map(|c| c.owner_user_id)
            .ok_or(GrantServiceError::UnknownCollection)
    }
}
