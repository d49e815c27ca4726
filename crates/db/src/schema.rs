//! Schema built from the entity definitions.
//!
//! Used to stand up embedded databases (SQLite in memory) for tests. Production
//! schemas come from [`crate::migration`], which also adds the composite unique
//! constraints and CHECK constraints the entities cannot express.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::entities::{
    academic_sessions, accounts, classes, discounts, enrollments, outstanding_balances,
    payment_type_accounts, payment_types, payments, receipts, students, terms, transactions,
};

async fn create<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Creates every table in dependency order.
///
/// # Errors
///
/// Returns an error if a statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create(db, &schema, academic_sessions::Entity).await?;
    create(db, &schema, terms::Entity).await?;
    create(db, &schema, classes::Entity).await?;
    create(db, &schema, students::Entity).await?;
    create(db, &schema, enrollments::Entity).await?;
    create(db, &schema, payment_types::Entity).await?;
    create(db, &schema, accounts::Entity).await?;
    create(db, &schema, payment_type_accounts::Entity).await?;
    create(db, &schema, discounts::Entity).await?;
    create(db, &schema, payments::Entity).await?;
    create(db, &schema, outstanding_balances::Entity).await?;
    create(db, &schema, receipts::Entity).await?;
    create(db, &schema, transactions::Entity).await?;

    Ok(())
}
