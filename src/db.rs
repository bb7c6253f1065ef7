use anyhow::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, Statement,
    sea_query::Index,
};
use std::path::PathBuf;
use tokio::fs;

use crate::entity::{
    AuditLogs, CartItems, Carts, Cars, Flights, Hotels, OrderItems, Orders, Packages,
    cart_items::Column as CartItemCol,
};

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Minimal migration runner that executes SQL files in `migrations/` in filename order.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<usize> {
    let mut entries = fs::read_dir("migrations").await?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();
    for file in &files {
        tracing::info!(file = %file.display(), "applying migration");
        let sql = fs::read_to_string(file).await?;
        // Postgres prepared statements cannot contain multiple commands,
        // so split the migration file and run each statement individually.
        for stmt in sql.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            let statement = format!("{stmt};");
            conn.execute(Statement::from_string(backend, statement))
                .await?;
        }
    }

    Ok(files.len())
}

/// Build the schema straight from the entity definitions.
///
/// Used where the Postgres migrations do not apply (SQLite). Carries the same
/// uniqueness guarantees: one cart per user and one line per
/// `(cart_id, type_item, item_id)`.
pub async fn create_schema(conn: &DatabaseConnection) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    create_table(conn, &schema, Flights).await?;
    create_table(conn, &schema, Hotels).await?;
    create_table(conn, &schema, Packages).await?;
    create_table(conn, &schema, Cars).await?;
    create_table(conn, &schema, Carts).await?;
    create_table(conn, &schema, CartItems).await?;
    create_table(conn, &schema, Orders).await?;
    create_table(conn, &schema, OrderItems).await?;
    create_table(conn, &schema, AuditLogs).await?;

    let cart_line_unique = Index::create()
        .name("cart_items_cart_product_key")
        .table(CartItems)
        .col(CartItemCol::CartId)
        .col(CartItemCol::TypeItem)
        .col(CartItemCol::ItemId)
        .unique()
        .if_not_exists()
        .to_owned();
    conn.execute(backend.build(&cart_line_unique)).await?;

    Ok(())
}

async fn create_table<E>(conn: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let backend = conn.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    conn.execute(backend.build(&stmt)).await?;

    for index in schema.create_index_from_entity(entity) {
        let mut index = index;
        index.if_not_exists();
        conn.execute(backend.build(&index)).await?;
    }

    Ok(())
}
