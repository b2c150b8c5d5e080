//! Database configuration module for the school desk.
//!
//! This module opens the `SQLite` store and creates all tables from the entity
//! definitions with `SeaORM`'s `Schema::create_table_from_entity`, so the schema always
//! matches the Rust structs. Tables are created with `IF NOT EXISTS`, which makes
//! opening an existing store file idempotent.

use crate::entities::{Attendance, Class, Exam, Grade, Student, Subject, Teacher};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::TableCreateStatement,
};
use std::path::Path;
use tracing::{debug, info};

/// Default store location when neither config.toml nor `DATABASE_URL` names one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/school.sqlite?mode=rwc";

/// File path named by a `sqlite:` URL, or `None` for in-memory stores.
fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(Path::new(path))
}

/// Opens the store at `database_url` and makes sure every table exists.
///
/// The returned handle is owned by the caller, who is expected to pass it to every
/// core function and to close it when the session ends.
pub async fn open_store(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Opening store at {database_url}");
    let parent = sqlite_file_path(database_url)
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::connect(database_url).await?;
    create_tables(&db).await?;
    info!("Store ready");
    Ok(db)
}

fn create_statement<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    statement
}

/// Creates all tables that do not exist yet.
///
/// Unique columns (`student_code`, teacher and subject `name`) come from the
/// `#[sea_orm(unique)]` attributes on the entities.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let statements = [
        create_statement(&schema, Student),
        create_statement(&schema, Teacher),
        create_statement(&schema, Subject),
        create_statement(&schema, Class),
        create_statement(&schema, Attendance),
        create_statement(&schema, Grade),
        create_statement(&schema, Exam),
    ];

    for statement in &statements {
        db.execute(builder.build(statement)).await?;
    }

    Ok(())
}

/// Deletes every row from every table, leaving the schema in place.
///
/// Exam artifacts in the blob store are not touched.
pub async fn clear_all_data(db: &DatabaseConnection) -> Result<u64> {
    let mut removed = 0;
    removed += Exam::delete_many().exec(db).await?.rows_affected;
    removed += Grade::delete_many().exec(db).await?.rows_affected;
    removed += Attendance::delete_many().exec(db).await?.rows_affected;
    removed += Class::delete_many().exec(db).await?.rows_affected;
    removed += Subject::delete_many().exec(db).await?.rows_affected;
    removed += Teacher::delete_many().exec(db).await?.rows_affected;
    removed += Student::delete_many().exec(db).await?.rows_affected;
    info!("Cleared {removed} rows from the store");
    Ok(removed)
}
