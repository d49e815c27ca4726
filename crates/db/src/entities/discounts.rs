//! `SeaORM` Entity for discounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "discounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub payment_type_id: Uuid,
    pub session_id: Uuid,
    pub term_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Students,
    #[sea_orm(
        belongs_to = "super::payment_types::Entity",
        from = "Column::PaymentTypeId",
        to = "super::payment_types::Column::Id"
    )]
    PaymentTypes,
    #[sea_orm(
        belongs_to = "super::academic_sessions::Entity",
        from = "Column::SessionId",
        to = "super::academic_sessions::Column::Id"
    )]
    AcademicSessions,
    #[sea_orm(
        belongs_to = "super::terms::Entity",
        from = "Column::TermId",
        to = "super::terms::Column::Id"
    )]
    Terms,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::payment_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
