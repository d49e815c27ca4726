//! `SeaORM` Entity for payment_types table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::payment_type_accounts::Entity")]
    PaymentTypeAccounts,
}

impl Related<super::payment_type_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentTypeAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
