use std::sync::Arc;

use platform_authn::Principal;
use tracing::warn;

use crate::{AuthzError, GrantStore, HierarchyLookup, Level, ResourceRef, StoreError};

/// The decision engine. Stateless per call; holds only its store handles, so
/// any number of decisions may run concurrently.
#[derive(Clone)]
pub struct PolicyEngine {
    hierarchy: Arc<dyn HierarchyLookup>,
    grants: Arc<dyn GrantStore>,
}

impl PolicyEngine {
    pub fn new(hierarchy: Arc<dyn HierarchyLookup>, grants: Arc<dyn GrantStore>) -> Self {
        Self { hierarchy, grants }
    }

    /// Whether `principal` may perform a `level` operation on `resource`.
    ///
    /// Walks the chain: admin bypass, ancestor resolution, ownership,
    /// explicit grant, public visibility, order wallet match. Any store
    /// failure or unresolvable ancestor denies.
    pub async fn authorize(
        &self,
        principal: &Principal,
        resource: &ResourceRef,
        level: Level,
    ) -> bool {
        if principal.is_admin() {
            return true;
        }
        match self.decide(principal, resource, level).await {
            Ok(allowed) => allowed,
            Err(err) => {
                warn!(%resource, level = level.as_str(), error = %err, "store failure during authorization; denying");
                false
            }
        }
    }

    async fn decide(
        &self,
        principal: &Principal,
        resource: &ResourceRef,
        level: Level,
    ) -> Result<bool, StoreError> {
        let Some(collection_id) = self.hierarchy.ancestor_collection(resource).await? else {
            warn!(%resource, "ancestor chain broken; denying");
            return Ok(false);
        };

        if let Some(user_id) = principal.user_id {
            if self.grants.owner_of(collection_id).await? == Some(user_id) {
                // Owners hold full control of catalog nodes but only view
                // rights on buyer order records.
                return Ok(resource.is_catalog_node() || level == Level::View);
            }
            if let Some(granted) = self.grants.grant_for(user_id, collection_id).await? {
                return Ok(granted.satisfies(level));
            }
        }

        if level == Level::View
            && resource.is_catalog_node()
            && self.hierarchy.collection_visible(collection_id).await?
        {
            return Ok(true);
        }

        if let (ResourceRef::Order(order_id), Some(address)) = (resource, &principal.wallet_address)
        {
            if level == Level::View {
                if let Some(bound) = self.hierarchy.order_wallet(*order_id).await? {
                    return Ok(bound == *address);
                }
            }
        }

        Ok(false)
    }

    /// Single-resource enforcement: allow, or a deny the transport layer can
    /// surface as-is.
    pub async fn enforce(
        &self,
        principal: &Principal,
        resource: &ResourceRef,
        level: Level,
    ) -> Result<(), AuthzError> {
        if self.authorize(principal, resource, level).await {
            Ok(())
        } else {
            Err(AuthzError::Denied {
                action: level.as_str().to_string(),
                resource: resource.to_string(),
            })
        }
    }

    /// Listing enforcement: reduce `candidates` to the permitted subset,
    /// preserving order. Public browsing of visible collections short-circuits
    /// inside the shared decision path.
    pub async fn filter(
        &self,
        principal: &Principal,
        candidates: Vec<ResourceRef>,
        level: Level,
    ) -> Vec<ResourceRef> {
        let mut permitted = Vec::with_capacity(candidates.len());
        for resource in candidates {
            if self.authorize(principal, &resource, level).await {
                permitted.push(resource);
            }
        }
        permitted
    }
}
