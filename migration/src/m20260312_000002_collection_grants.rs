use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
#[sea_orm(iden = "user")]
enum User {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Collection {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum CollectionGrant {
    Table,
    UserId,
    CollectionId,
    Level,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CollectionGrant::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CollectionGrant::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(CollectionGrant::CollectionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionGrant::Level)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionGrant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_collection_grant")
                            .col(CollectionGrant::UserId)
                            .col(CollectionGrant::CollectionId),
                    )
                    .check(Expr::cust("(level IN ('VIEW','EDIT'))"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_collection_grant_collection")
                    .table(CollectionGrant::Table)
                    .col(CollectionGrant::CollectionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_collection_grant_user")
                    .from(CollectionGrant::Table, CollectionGrant::UserId)
                    .to(User::Table, User::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_collection_grant_collection")
                    .from(CollectionGrant::Table, CollectionGrant::CollectionId)
                    .to(Collection::Table, Collection::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk_collection_grant_collection")
                    .table(CollectionGrant::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk_collection_grant_user")
                    .table(CollectionGrant::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(CollectionGrant::Table).to_owned())
            .await?;
        Ok(())
    }
}
