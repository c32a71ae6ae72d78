use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Collection,
    Grant,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Collection => Entity::has_many(super::collection::Entity).into(),
            Relation::Grant => Entity::has_many(super::collection_grant::Entity).into(),
        }
    }
}

/// Stored role attribute. Administrator status is not a stored role; it is
/// resolved against the configured administrator directory.
#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Role {
    #[sea_orm(string_value = "MERCHANT")]
    Merchant,
    #[sea_orm(string_value = "USER")]
    User,
}

impl ActiveModelBehavior for ActiveModel {}
