use async_trait::async_trait;
use platform_authn::WalletAddress;
use uuid::Uuid;

use crate::{Level, ResourceRef, StoreError};

/// Read path over the catalog containment chain. Implementations resolve a
/// node to its owning collection in at most three point reads and surface
/// the two hierarchy facts decisions need beyond the ancestor id.
#[async_trait]
pub trait HierarchyLookup: Send + Sync {
    /// The owning collection of `resource`, or `None` when the chain is
    /// broken (orphaned row). A collection resolves to itself only if it
    /// exists.
    async fn ancestor_collection(&self, resource: &ResourceRef) -> Result<Option<Uuid>, StoreError>;

    /// The buyer address snapshot recorded on an order at checkout.
    async fn order_wallet(&self, order_id: Uuid) -> Result<Option<WalletAddress>, StoreError>;

    /// Whether the collection is marked publicly visible.
    async fn collection_visible(&self, collection_id: Uuid) -> Result<bool, StoreError>;
}

/// Read path over ownership facts and explicit grants. Grants are anchored
/// at the collection level only.
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn owner_of(&self, collection_id: Uuid) -> Result<Option<Uuid>, StoreError>;

    async fn grant_for(
        &self,
        user_id: Uuid,
        collection_id: Uuid,
    ) -> Result<Option<Level>, StoreError>;

    /// Whether the user owns at least one collection. Used by role
    /// classification, not by per-resource decisions.
    async fn owns_any(&self, user_id: Uuid) -> Result<bool, StoreError>;
}
