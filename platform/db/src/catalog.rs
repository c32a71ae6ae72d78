use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use entity::{category, collection, collection_grant, order, product};
use platform_authn::WalletAddress;
use platform_authz::{GrantStore, HierarchyLookup, Level, ResourceRef, StoreError};
use sea_orm::{ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::DbPool;

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(750);
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Point-read implementation of [`HierarchyLookup`] and [`GrantStore`].
/// Every lookup runs under a bounded timeout with one backoff retry; a
/// second failure surfaces as [`StoreError`] and the engine denies.
pub struct SeaOrmCatalog {
    db: DbPool,
    lookup_timeout: Duration,
}

impl SeaOrmCatalog {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_lookup_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    async fn read<T, Fut, F>(&self, op: &'static str, mut query: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        match timeout(self.lookup_timeout, query()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => warn!(op, error = %err, "store read failed; retrying once"),
            Err(_) => warn!(op, "store read timed out; retrying once"),
        }
        tokio::time::sleep(RETRY_BACKOFF).await;
        match timeout(self.lookup_timeout, query()).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(StoreError::Unavailable(err.to_string())),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

#[async_trait]
impl HierarchyLookup for SeaOrmCatalog {
    async fn ancestor_collection(&self, resource: &ResourceRef) -> Result<Option<Uuid>, StoreError> {
        match *resource {
            ResourceRef::Collection(id) => {
                let found = self
                    .read("collection_exists", || {
                        collection::Entity::find_by_id(id).one(&self.db)
                    })
                    .await?;
                Ok(found.map(|c| c.id))
            }
            ResourceRef::Category(id) => self.category_ancestor(id).await,
            ResourceRef::Product(id) => {
                let Some(found) = self
                    .read("product_lookup", || {
                        product::Entity::find_by_id(id).one(&self.db)
                    })
                    .await?
                else {
                    return Ok(None);
                };
                self.category_ancestor(found.category_id).await
            }
            ResourceRef::Order(id) => {
                let Some(found) = self
                    .read("order_lookup", || order::Entity::find_by_id(id).one(&self.db))
                    .await?
                else {
                    return Ok(None);
                };
                let Some(parent) = self
                    .read("product_lookup", || {
                        product::Entity::find_by_id(found.product_id).one(&self.db)
                    })
                    .await?
                else {
                    return Ok(None);
                };
                self.category_ancestor(parent.category_id).await
            }
        }
    }

    async fn order_wallet(&self, order_id: Uuid) -> Result<Option<WalletAddress>, StoreError> {
        let Some(found) = self
            .read("order_wallet", || {
                order::Entity::find_by_id(order_id).one(&self.db)
            })
            .await?
        else {
            return Ok(None);
        };
        match WalletAddress::parse(&found.wallet_address) {
            Ok(address) => Ok(Some(address)),
            Err(_) => {
                warn!(%order_id, "order carries an unparseable wallet address");
                Ok(None)
            }
        }
    }

    async fn collection_visible(&self, collection_id: Uuid) -> Result<bool, StoreError> {
        let found = self
            .read("collection_visible", || {
                collection::Entity::find_by_id(collection_id).one(&self.db)
            })
            .await?;
        Ok(found.map(|c| c.visible).unwrap_or(false))
    }
}

impl SeaOrmCatalog {
    async fn category_ancestor(&self, category_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let found = self
            .read("category_lookup", || {
                category::Entity::find_by_id(category_id).one(&self.db)
            })
            .await?;
        Ok(found.map(|c| c.collection_id))
    }
}

#[async_trait]
impl GrantStore for SeaOrmCatalog {
    async fn owner_of(&self, collection_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let found = self
            .read("owner_of", || {
                collection::Entity::find_by_id(collection_id).one(&self.db)
            })
            .await?;
        Ok(found.map(|c| c.owner_user_id))
    }

    async fn grant_for(
        &self,
        user_id: Uuid,
        collection_id: Uuid,
    ) -> Result<Option<Level>, StoreError> {
        let found = self
            .read("grant_for", || {
                collection_grant::Entity::find_by_id((user_id, collection_id)).one(&self.db)
            })
            .await?;
        Ok(found.map(|g| level_from_entity(g.level)))
    }

    async fn owns_any(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let count = self
            .read("owns_any", || {
                collection::Entity::find()
                    .filter(collection::Column::OwnerUserId.eq(user_id))
                    .count(&self.db)
            })
            .await?;
        Ok(count > 0)
    }
}

pub(crate) fn level_from_entity(level: collection_grant::Level) -> Level {
    match level {
        collection_grant::Level::View => Level::View,
        collection_grant::Level::Edit => Level::Edit,
    }
}

pub(crate) fn level_to_entity(level: Level) -> collection_grant::Level {
    match level {
        Level::View => collection_grant::Level::View,
        Level::Edit => collection_grant::Level::Edit,
    }
}
