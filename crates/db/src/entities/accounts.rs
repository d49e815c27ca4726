//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AccountStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub owner: Option<String>,
    pub permissions: Option<String>,
    pub notes: Option<String>,
    pub status: AccountStatus,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub minimum_balance: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment_type_accounts::Entity")]
    PaymentTypeAccounts,
}

impl Related<super::payment_type_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentTypeAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
