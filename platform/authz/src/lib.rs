//! Hierarchical authorization for the storefront catalog.
//!
//! Decisions compose down the collection → category → product → order
//! containment chain: rights on a collection flow to everything beneath it,
//! and a buyer's verified wallet address unlocks exactly their own orders.
//! Every ambiguity, broken link, or store failure resolves to deny.

pub mod admin;
mod classify;
mod engine;
mod resource;
mod store;

use thiserror::Error;

pub use classify::RoleClassifier;
pub use engine::PolicyEngine;
pub use resource::{Level, ResourceRef};
pub use store::{GrantStore, HierarchyLookup};

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("action {action} denied for resource {resource}")]
    Denied { action: String, resource: String },
}

/// Failure of the underlying grant/hierarchy store. Decision paths collapse
/// these to deny; only logs carry the kind.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lookup timed out")]
    Timeout,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
