//! Teacher business logic - Handles all teacher-related operations.
//!
//! Teacher names are unique; a second teacher with the same name is reported as
//! [`Error::DuplicateKey`] so the caller can tell the user instead of failing hard.

use crate::{
    core::{optional_text, required_text},
    entities::{Teacher, teacher},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Retrieves all teachers ordered alphabetically by name.
pub async fn list_teachers(db: &DatabaseConnection) -> Result<Vec<teacher::Model>> {
    Teacher::find()
        .order_by_asc(teacher::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a teacher by id.
pub async fn get_teacher_by_id(
    db: &DatabaseConnection,
    teacher_id: i64,
) -> Result<Option<teacher::Model>> {
    Teacher::find_by_id(teacher_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a teacher by exact (trimmed) name.
pub async fn get_teacher_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<teacher::Model>> {
    Teacher::find()
        .filter(teacher::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a teacher. A blank email is stored as `None`.
///
/// Names are unique, so adding the same person twice fails with `DuplicateKey`
/// and leaves the first row untouched.
pub async fn create_teacher(
    db: &DatabaseConnection,
    name: &str,
    email: Option<String>,
) -> Result<teacher::Model> {
    let name = required_text(name, "Teacher name")?;

    let teacher = teacher::ActiveModel {
        name: Set(name.clone()),
        email: Set(optional_text(email)),
        ..Default::default()
    };

    teacher
        .insert(db)
        .await
        .map_err(|e| Error::from_write(e, "Teacher", "name", &name))
}

/// Renames a teacher and replaces their email.
pub async fn update_teacher(
    db: &DatabaseConnection,
    teacher_id: i64,
    name: &str,
    email: Option<String>,
) -> Result<teacher::Model> {
    let name = required_text(name, "Teacher name")?;

    let mut teacher: teacher::ActiveModel = Teacher::find_by_id(teacher_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Teacher",
            id: teacher_id,
        })?
        .into();

    teacher.name = Set(name.clone());
    teacher.email = Set(optional_text(email));

    teacher
        .update(db)
        .await
        .map_err(|e| Error::from_write(e, "Teacher", "name", &name))
}

/// Deletes a teacher. Classes that reference the teacher keep the dangling id.
pub async fn delete_teacher(db: &DatabaseConnection, teacher_id: i64) -> Result<()> {
    let result = Teacher::delete_by_id(teacher_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Teacher",
            id: teacher_id,
        });
    }
    Ok(())
}
