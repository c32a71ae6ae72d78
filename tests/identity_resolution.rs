//! End-to-end flows from raw credential material to an access decision.

use std::sync::Arc;

use platform_authn::{
    AdminDirectory, AuthConfig, AuthError, CredentialBundle, HsJwtWalletVerifier,
    IdentityResolver, Role, SessionClaims, WalletAddress, WalletHeaders, issue_session_token,
    issue_wallet_proof,
};
use platform_authz::{Level, ResourceRef, RoleClassifier};
use serde_json::json;
use storefront_tests::FakeStore;
use uuid::Uuid;

fn auth_config() -> AuthConfig {
    AuthConfig::new("integration-secret", 60)
}

fn resolver(admins: AdminDirectory) -> IdentityResolver {
    let config = auth_config();
    IdentityResolver::new(
        config.clone(),
        admins,
        Arc::new(HsJwtWalletVerifier::new(config)),
    )
}

fn session_bundle(claims: &SessionClaims) -> CredentialBundle {
    CredentialBundle {
        session_token: Some(issue_session_token(claims, &auth_config()).unwrap()),
        wallet: None,
    }
}

fn wallet_bundle(address: &str) -> CredentialBundle {
    let parsed = WalletAddress::parse(address).unwrap();
    CredentialBundle {
        session_token: None,
        wallet: Some(WalletHeaders {
            address: address.to_string(),
            token: issue_wallet_proof(&parsed, &auth_config()).unwrap(),
        }),
    }
}

#[tokio::test]
async fn wallet_buyer_reaches_exactly_their_own_order() {
    let mut store = FakeStore::default();
    let collection = store.add_collection(Uuid::new_v4(), false);
    let category = store.add_category(collection);
    let product = store.add_product(category);
    let own_order = store.add_order(product, "0xBuyer1");
    let other_order = store.add_order(product, "0xBuyer2");
    let engine = store.into_engine();

    let principal = resolver(AdminDirectory::default())
        .resolve(&wallet_bundle("0xBuyer1"))
        .unwrap();

    assert!(
        engine
            .authorize(&principal, &ResourceRef::Order(own_order), Level::View)
            .await
    );
    assert!(
        !engine
            .authorize(&principal, &ResourceRef::Order(other_order), Level::View)
            .await
    );
    assert!(
        !engine
            .authorize(&principal, &ResourceRef::Order(own_order), Level::Edit)
            .await
    );
}

#[tokio::test]
async fn session_merchant_edits_their_own_catalog() {
    let user_id = Uuid::new_v4();
    let mut store = FakeStore::default();
    let collection = store.add_collection(user_id, false);
    let category = store.add_category(collection);
    let product = store.add_product(category);

    let claims = SessionClaims::for_user(user_id, &auth_config());
    let principal = resolver(AdminDirectory::default())
        .resolve(&session_bundle(&claims))
        .unwrap();

    // Stored role says plain user; ownership classifies them merchant.
    let classified = RoleClassifier::new(AdminDirectory::default())
        .classify(&principal, &store)
        .await;
    assert_eq!(classified, Role::Merchant);

    let engine = store.into_engine();
    assert!(
        engine
            .authorize(&principal, &ResourceRef::Product(product), Level::Edit)
            .await
    );
}

#[tokio::test]
async fn configured_admin_bypasses_a_broken_chain() {
    let user_id = Uuid::new_v4();
    let mut store = FakeStore::default();
    let orphan = store.add_orphan_category();

    let admins = AdminDirectory::new([user_id], Vec::<String>::new());
    let claims = SessionClaims::for_user(user_id, &auth_config());
    let principal = resolver(admins).resolve(&session_bundle(&claims)).unwrap();
    assert_eq!(principal.role, Role::Admin);

    let engine = store.into_engine();
    assert!(
        engine
            .authorize(&principal, &ResourceRef::Category(orphan), Level::Edit)
            .await
    );
}

#[tokio::test]
async fn conflicting_channels_never_produce_a_principal() {
    let user_id = Uuid::new_v4();
    let mut claims = SessionClaims::for_user(user_id, &auth_config());
    claims.user_metadata = Some(json!({"wallet_address": "0xWk1"}));

    let mut bundle = wallet_bundle("0xWk2");
    bundle.session_token = Some(issue_session_token(&claims, &auth_config()).unwrap());

    let err = resolver(AdminDirectory::default())
        .resolve(&bundle)
        .unwrap_err();
    assert!(matches!(err, AuthError::ConflictingIdentity));
}

#[tokio::test]
async fn session_claim_wallet_unlocks_orders_without_wallet_headers() {
    let mut store = FakeStore::default();
    let collection = store.add_collection(Uuid::new_v4(), false);
    let category = store.add_category(collection);
    let product = store.add_product(category);
    let order = store.add_order(product, "0xEmbedded");
    let engine = store.into_engine();

    let mut claims = SessionClaims::for_user(Uuid::new_v4(), &auth_config());
    claims.app_metadata = Some(json!({"wallet_address": "0xEmbedded"}));
    let principal = resolver(AdminDirectory::default())
        .resolve(&session_bundle(&claims))
        .unwrap();

    assert!(
        engine
            .authorize(&principal, &ResourceRef::Order(order), Level::View)
            .await
    );
}

#[tokio::test]
async fn unrecognized_wallet_token_shape_is_rejected() {
    let bundle = CredentialBundle {
        session_token: None,
        wallet: Some(WalletHeaders {
            address: "0xBuyer1".into(),
            token: "definitely-not-a-recognized-shape".into(),
        }),
    };
    let err = resolver(AdminDirectory::default())
        .resolve(&bundle)
        .unwrap_err();
    assert!(matches!(err, AuthError::MalformedToken));
}
