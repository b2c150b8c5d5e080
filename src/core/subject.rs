//! Subject business logic - Handles all subject-related operations.
//!
//! Subject names are unique. Deleting a subject leaves classes and exams that
//! point at it untouched; their `subject_id` simply stops resolving.

use crate::{
    core::{optional_text, required_text},
    entities::{Subject, subject},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashMap;

/// Retrieves all subjects ordered alphabetically by name.
pub async fn list_subjects(db: &DatabaseConnection) -> Result<Vec<subject::Model>> {
    Subject::find()
        .order_by_asc(subject::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a subject by id.
pub async fn get_subject_by_id(
    db: &DatabaseConnection,
    subject_id: i64,
) -> Result<Option<subject::Model>> {
    Subject::find_by_id(subject_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a subject by exact (trimmed) name.
///
/// Used to resolve a subject typed by the user before creating classes or
/// filtering exams. Matching is case-sensitive.
pub async fn get_subject_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<subject::Model>> {
    Subject::find()
        .filter(subject::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a subject. A blank description is stored as `None`.
pub async fn create_subject(
    db: &DatabaseConnection,
    name: &str,
    description: Option<String>,
) -> Result<subject::Model> {
    let name = required_text(name, "Subject name")?;

    let subject = subject::ActiveModel {
        name: Set(name.clone()),
        description: Set(optional_text(description)),
        ..Default::default()
    };

    subject
        .insert(db)
        .await
        .map_err(|e| Error::from_write(e, "Subject", "name", &name))
}

/// Renames a subject and replaces its description.
pub async fn update_subject(
    db: &DatabaseConnection,
    subject_id: i64,
    name: &str,
    description: Option<String>,
) -> Result<subject::Model> {
    let name = required_text(name, "Subject name")?;

    let mut subject: subject::ActiveModel = Subject::find_by_id(subject_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Subject",
            id: subject_id,
        })?
        .into();

    subject.name = Set(name.clone());
    subject.description = Set(optional_text(description));

    subject
        .update(db)
        .await
        .map_err(|e| Error::from_write(e, "Subject", "name", &name))
}

/// Deletes a subject without touching classes or exams that reference it.
pub async fn delete_subject(db: &DatabaseConnection, subject_id: i64) -> Result<()> {
    let result = Subject::delete_by_id(subject_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Subject",
            id: subject_id,
        });
    }
    Ok(())
}

/// All subject names keyed by id, for resolving soft references in listings.
pub(crate) async fn subject_names(db: &DatabaseConnection) -> Result<HashMap<i64, String>> {
    Ok(Subject::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect())
}
