//! Database access: entity definitions and the service functions that
//! encapsulate all queries and mutations. Handlers never touch SeaORM
//! directly; they go through `db::services`.

pub mod entities;
pub mod services;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use tracing::info;

pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(url).await
}

/// Creates any table that does not exist yet from the entity definitions.
/// The schema is small enough that generated DDL beats a migration stack.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = [
        schema.create_table_from_entity(entities::user::Entity),
        schema.create_table_from_entity(entities::profile::Entity),
        schema.create_table_from_entity(entities::tag::Entity),
        schema.create_table_from_entity(entities::event::Entity),
        schema.create_table_from_entity(entities::event_tag::Entity),
        schema.create_table_from_entity(entities::profile_tag::Entity),
    ];

    for statement in statements.iter_mut() {
        statement.if_not_exists();
        db.execute(backend.build(statement)).await?;
    }

    info!("database schema is in place");
    Ok(())
}
