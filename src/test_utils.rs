//! Shared test utilities for the school desk.
//!
//! This module provides helpers for setting up test databases, creating entities
//! with sensible defaults, and in-memory blob stores for the exam registry.

use crate::{
    core::{class, student, subject, teacher},
    entities,
    errors::{Error, Result},
    storage::BlobStore,
};
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a student with the given code.
///
/// # Defaults
/// * `first_name`: "Test"
/// * `last_name`: "Student <code>"
/// * `extra`: None
pub async fn create_test_student(
    db: &DatabaseConnection,
    student_code: &str,
) -> Result<entities::student::Model> {
    student::create_student(
        db,
        student_code,
        "Test",
        &format!("Student {student_code}"),
        None,
    )
    .await
}

/// Creates a teacher with no email.
pub async fn create_test_teacher(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::teacher::Model> {
    teacher::create_teacher(db, name, None).await
}

/// Creates a subject with no description.
pub async fn create_test_subject(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::subject::Model> {
    subject::create_subject(db, name, None).await
}

/// Creates a class with no subject, teacher or schedule.
pub async fn create_test_class(
    db: &DatabaseConnection,
    class_name: &str,
) -> Result<entities::class::Model> {
    class::create_class(db, class_name, None, None, None).await
}

/// Sets up a test environment with one class and one student.
/// Returns (db, class, student) for attendance and grade tests.
pub async fn setup_with_class_and_student() -> Result<(
    DatabaseConnection,
    entities::class::Model,
    entities::student::Model,
)> {
    let db = setup_test_db().await?;
    let class = create_test_class(&db, "Test Class").await?;
    let student = student::create_student(&db, "A001", "Juan", "Pérez", None).await?;
    Ok((db, class, student))
}

/// Blob store that keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

fn missing(name: &str) -> Error {
    Error::ArtifactIo {
        name: name.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such artifact"),
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        crate::storage::validate_name(name)?;
        self.blobs
            .lock()
            .map_err(|_| missing(name))?
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .map_err(|_| missing(name))?
            .get(name)
            .cloned()
            .ok_or_else(|| missing(name))
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.blobs
            .lock()
            .map_err(|_| missing(name))?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| missing(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.blobs
            .lock()
            .is_ok_and(|blobs| blobs.contains_key(name))
    }
}

impl MemoryBlobStore {
    /// Number of stored artifacts.
    pub fn stored_count(&self) -> usize {
        self.blobs.lock().map_or(0, |blobs| blobs.len())
    }
}

/// Blob store whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingBlobStore;

impl BlobStore for FailingBlobStore {
    fn put(&self, name: &str, _bytes: &[u8]) -> Result<()> {
        Err(Error::ArtifactIo {
            name: name.to_string(),
            source: std::io::Error::other("disk full"),
        })
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        Err(missing(name))
    }

    fn delete(&self, name: &str) -> Result<()> {
        Err(missing(name))
    }

    fn exists(&self, _name: &str) -> bool {
        false
    }
}
