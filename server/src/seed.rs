use anyhow::Result;
use chrono::Utc;
use entity::{category, collection, collection_grant, order, product, user};
use platform_db::DbPool;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, TransactionTrait};
use tracing::info;
use uuid::Uuid;

const DEMO_WALLET: &str = "0x00000000000000000000000000000000000d3m0";

/// Insert a browsable demo catalog: one merchant with a visible collection,
/// one shopper holding a view grant, and one wallet-bound order.
pub async fn seed_demo(db: &DbPool) -> Result<()> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let txn = db.begin().await?;

    let merchant_id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(merchant_id),
        email: Set(format!("merchant+{}@demo.storefront", merchant_id.simple())),
        display_name: Set("Demo Merchant".into()),
        role: Set(user::Role::Merchant),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let shopper_id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(shopper_id),
        email: Set(format!("shopper+{}@demo.storefront", shopper_id.simple())),
        display_name: Set("Demo Shopper".into()),
        role: Set(user::Role::User),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let collection_id = Uuid::new_v4();
    collection::ActiveModel {
        id: Set(collection_id),
        owner_user_id: Set(merchant_id),
        title: Set("Genesis Drop".into()),
        visible: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let category_id = Uuid::new_v4();
    category::ActiveModel {
        id: Set(category_id),
        collection_id: Set(collection_id),
        title: Set("Prints".into()),
        position: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let product_id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(product_id),
        category_id: Set(category_id),
        title: Set("Signed Print #1".into()),
        price_cents: Set(4_500),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    order::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        wallet_address: Set(DEMO_WALLET.into()),
        status: Set(order::Status::Paid),
        amount_cents: Set(4_500),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    collection_grant::ActiveModel {
        user_id: Set(shopper_id),
        collection_id: Set(collection_id),
        level: Set(collection_grant::Level::View),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(%collection_id, %merchant_id, "demo catalog seeded");
    Ok(())
}
