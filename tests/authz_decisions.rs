use std::sync::Arc;

use platform_authn::{Principal, Role, WalletAddress};
use platform_authz::{Level, PolicyEngine, ResourceRef};
use storefront_tests::{FailingStore, FakeStore};
use uuid::Uuid;

fn admin() -> Principal {
    Principal::session_user(Uuid::new_v4(), None, Role::Admin)
}

fn merchant(user_id: Uuid) -> Principal {
    Principal::session_user(user_id, None, Role::Merchant)
}

fn shopper(user_id: Uuid) -> Principal {
    Principal::session_user(user_id, None, Role::User)
}

fn wallet_principal(address: &str) -> Principal {
    Principal::wallet_holder(WalletAddress::parse(address).unwrap())
}

struct Catalog {
    owner: Uuid,
    collection: Uuid,
    category: Uuid,
    product: Uuid,
    order: Uuid,
}

struct Storefront {
    engine: PolicyEngine,
    owner: Uuid,
    collection: Uuid,
    category: Uuid,
    product: Uuid,
    order: Uuid,
}

/// A collection owned by one merchant; a category under it; a product under
/// that; an order on the product bound to "0xAddr123".
fn seed_catalog(store: &mut FakeStore, visible: bool) -> Catalog {
    let owner = Uuid::new_v4();
    let collection = store.add_collection(owner, visible);
    let category = store.add_category(collection);
    let product = store.add_product(category);
    let order = store.add_order(product, "0xAddr123");
    Catalog {
        owner,
        collection,
        category,
        product,
        order,
    }
}

fn build(visible: bool) -> Storefront {
    let mut store = FakeStore::default();
    let catalog = seed_catalog(&mut store, visible);
    Storefront {
        engine: store.into_engine(),
        owner: catalog.owner,
        collection: catalog.collection,
        category: catalog.category,
        product: catalog.product,
        order: catalog.order,
    }
}

#[tokio::test]
async fn admin_bypasses_every_check() {
    let world = build(false);
    let admin = admin();
    for resource in [
        ResourceRef::Collection(world.collection),
        ResourceRef::Category(world.category),
        ResourceRef::Product(world.product),
        ResourceRef::Order(world.order),
        // Even a dangling reference: admins skip resolution entirely.
        ResourceRef::Category(Uuid::new_v4()),
    ] {
        for level in [Level::View, Level::Edit] {
            assert!(
                world.engine.authorize(&admin, &resource, level).await,
                "admin denied {level:?} on {resource}"
            );
        }
    }
}

#[tokio::test]
async fn ownership_grants_edit_on_every_catalog_descendant() {
    let world = build(false);
    let owner = merchant(world.owner);
    for resource in [
        ResourceRef::Collection(world.collection),
        ResourceRef::Category(world.category),
        ResourceRef::Product(world.product),
    ] {
        assert!(world.engine.authorize(&owner, &resource, Level::Edit).await);
        assert!(world.engine.authorize(&owner, &resource, Level::View).await);
    }
}

#[tokio::test]
async fn owners_get_view_but_never_edit_on_buyer_orders() {
    let world = build(false);
    let owner = merchant(world.owner);
    let order = ResourceRef::Order(world.order);
    assert!(world.engine.authorize(&owner, &order, Level::View).await);
    assert!(!world.engine.authorize(&owner, &order, Level::Edit).await);
}

#[tokio::test]
async fn edit_grant_implies_view_and_edit_below_the_collection() {
    let mut store = FakeStore::default();
    let catalog = seed_catalog(&mut store, false);
    let grantee = Uuid::new_v4();
    store.grant(grantee, catalog.collection, Level::Edit);
    let engine = store.into_engine();

    let principal = shopper(grantee);
    for resource in [
        ResourceRef::Collection(catalog.collection),
        ResourceRef::Category(catalog.category),
        ResourceRef::Product(catalog.product),
    ] {
        assert!(engine.authorize(&principal, &resource, Level::View).await);
        assert!(engine.authorize(&principal, &resource, Level::Edit).await);
    }
}

#[tokio::test]
async fn view_grant_never_implies_edit() {
    let mut store = FakeStore::default();
    let catalog = seed_catalog(&mut store, false);
    let grantee = Uuid::new_v4();
    store.grant(grantee, catalog.collection, Level::View);
    let engine = store.into_engine();

    let principal = shopper(grantee);
    let product = ResourceRef::Product(catalog.product);
    assert!(engine.authorize(&principal, &product, Level::View).await);
    assert!(!engine.authorize(&principal, &product, Level::Edit).await);
}

#[tokio::test]
async fn wallet_match_unlocks_exactly_the_buyers_own_order() {
    let world = build(false);
    let order = ResourceRef::Order(world.order);

    let buyer = wallet_principal("0xAddr123");
    assert!(world.engine.authorize(&buyer, &order, Level::View).await);
    assert!(!world.engine.authorize(&buyer, &order, Level::Edit).await);

    let stranger = wallet_principal("0xAddr999");
    assert!(!world.engine.authorize(&stranger, &order, Level::View).await);
}

#[tokio::test]
async fn wallet_addresses_match_case_insensitively_for_hex() {
    let world = build(false);
    let order = ResourceRef::Order(world.order);
    let buyer = wallet_principal("0XADDR123");
    assert!(world.engine.authorize(&buyer, &order, Level::View).await);
}

#[tokio::test]
async fn broken_ancestor_chain_denies_everyone_but_admin() {
    let mut store = FakeStore::default();
    let orphan = store.add_orphan_category();
    let owner = Uuid::new_v4();
    store.add_collection(owner, true);
    let engine = store.into_engine();

    let resource = ResourceRef::Category(orphan);
    assert!(!engine.authorize(&merchant(owner), &resource, Level::View).await);
    assert!(!engine.authorize(&shopper(Uuid::new_v4()), &resource, Level::View).await);
    assert!(!engine.authorize(&Principal::anonymous(), &resource, Level::View).await);
    assert!(engine.authorize(&admin(), &resource, Level::View).await);
}

#[tokio::test]
async fn store_failure_denies_instead_of_erroring() {
    let engine = PolicyEngine::new(Arc::new(FailingStore), Arc::new(FailingStore));
    let resource = ResourceRef::Collection(Uuid::new_v4());
    assert!(!engine.authorize(&shopper(Uuid::new_v4()), &resource, Level::View).await);
    // Admin bypass precedes every store access.
    assert!(engine.authorize(&admin(), &resource, Level::Edit).await);
}

#[tokio::test]
async fn anonymous_view_follows_collection_visibility() {
    let visible_world = build(true);
    let hidden_world = build(false);
    let anon = Principal::anonymous();

    assert!(
        visible_world
            .engine
            .authorize(&anon, &ResourceRef::Category(visible_world.category), Level::View)
            .await
    );
    assert!(
        !hidden_world
            .engine
            .authorize(&anon, &ResourceRef::Category(hidden_world.category), Level::View)
            .await
    );
}

#[tokio::test]
async fn public_visibility_never_extends_to_orders_or_edits() {
    let world = build(true);
    let anon = Principal::anonymous();
    assert!(
        !world
            .engine
            .authorize(&anon, &ResourceRef::Order(world.order), Level::View)
            .await
    );
    assert!(
        !world
            .engine
            .authorize(&anon, &ResourceRef::Product(world.product), Level::Edit)
            .await
    );
}

#[tokio::test]
async fn filter_keeps_only_permitted_candidates_in_order() {
    let mut store = FakeStore::default();
    let owner = Uuid::new_v4();
    let mine_hidden = store.add_collection(owner, false);
    let public = store.add_collection(Uuid::new_v4(), true);
    let foreign_hidden = store.add_collection(Uuid::new_v4(), false);
    let engine = store.into_engine();

    let candidates = vec![
        ResourceRef::Collection(mine_hidden),
        ResourceRef::Collection(public),
        ResourceRef::Collection(foreign_hidden),
    ];

    let merchant_view = engine
        .filter(&merchant(owner), candidates.clone(), Level::View)
        .await;
    assert_eq!(
        merchant_view,
        vec![
            ResourceRef::Collection(mine_hidden),
            ResourceRef::Collection(public),
        ]
    );

    let anon_view = engine
        .filter(&Principal::anonymous(), candidates.clone(), Level::View)
        .await;
    assert_eq!(anon_view, vec![ResourceRef::Collection(public)]);

    let admin_view = engine.filter(&admin(), candidates.clone(), Level::Edit).await;
    assert_eq!(admin_view, candidates);
}

#[tokio::test]
async fn storefront_scenario_end_to_end() {
    let world = build(true);
    let order = ResourceRef::Order(world.order);
    let category = ResourceRef::Category(world.category);

    assert!(!world.engine.authorize(&merchant(world.owner), &order, Level::Edit).await);
    assert!(world.engine.authorize(&wallet_principal("0xAddr123"), &order, Level::View).await);
    assert!(!world.engine.authorize(&wallet_principal("0xAddr999"), &order, Level::View).await);
    assert!(world.engine.authorize(&Principal::anonymous(), &category, Level::View).await);
}
