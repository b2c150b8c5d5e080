//! Student business logic - Handles all student-related operations.
//!
//! Provides functions for creating, retrieving, updating and deleting students, plus
//! the roster ordering (last name, first name) every student-facing listing uses.
//! Students are referenced by id from attendance and grade rows without enforced
//! foreign keys, so lookups here return `Option` and callers decide how to show a
//! missing student.

use crate::{
    core::{optional_text, required_text},
    entities::{Student, student},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Retrieves all students ordered by last name, then first name.
pub async fn list_students(db: &DatabaseConnection) -> Result<Vec<student::Model>> {
    Student::find()
        .order_by_asc(student::Column::LastName)
        .order_by_asc(student::Column::FirstName)
        .order_by_asc(student::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a student by id.
pub async fn get_student_by_id(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Option<student::Model>> {
    Student::find_by_id(student_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a student by their school code.
pub async fn get_student_by_code(
    db: &DatabaseConnection,
    student_code: &str,
) -> Result<Option<student::Model>> {
    Student::find()
        .filter(student::Column::StudentCode.eq(student_code.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Counts all students.
pub async fn count_students(db: &DatabaseConnection) -> Result<u64> {
    Student::find().count(db).await.map_err(Into::into)
}

/// Creates a new student, trimming all text fields.
///
/// # Errors
/// - `InvalidInput` if the code or either name is blank
/// - `DuplicateKey` if another student already has this code
pub async fn create_student(
    db: &DatabaseConnection,
    student_code: &str,
    first_name: &str,
    last_name: &str,
    extra: Option<String>,
) -> Result<student::Model> {
    let student_code = required_text(student_code, "Student code")?;
    let first_name = required_text(first_name, "First name")?;
    let last_name = required_text(last_name, "Last name")?;

    let student = student::ActiveModel {
        student_code: Set(student_code.clone()),
        first_name: Set(first_name),
        last_name: Set(last_name),
        extra: Set(optional_text(extra)),
        ..Default::default()
    };

    student
        .insert(db)
        .await
        .map_err(|e| Error::from_write(e, "Student", "student_code", &student_code))
}

/// Replaces a student's code, names and notes.
///
/// # Errors
/// - `NotFound` if no student has this id
/// - `InvalidInput` / `DuplicateKey` as for [`create_student`]
pub async fn update_student(
    db: &DatabaseConnection,
    student_id: i64,
    student_code: &str,
    first_name: &str,
    last_name: &str,
    extra: Option<String>,
) -> Result<student::Model> {
    let student_code = required_text(student_code, "Student code")?;
    let first_name = required_text(first_name, "First name")?;
    let last_name = required_text(last_name, "Last name")?;

    let mut student: student::ActiveModel = Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Student",
            id: student_id,
        })?
        .into();

    student.student_code = Set(student_code.clone());
    student.first_name = Set(first_name);
    student.last_name = Set(last_name);
    student.extra = Set(optional_text(extra));

    student
        .update(db)
        .await
        .map_err(|e| Error::from_write(e, "Student", "student_code", &student_code))
}

/// Deletes a student row. Attendance and grade rows pointing at it are kept.
pub async fn delete_student(db: &DatabaseConnection, student_id: i64) -> Result<()> {
    let result = Student::delete_by_id(student_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Student",
            id: student_id,
        });
    }
    Ok(())
}

/// Loads the students with the given ids, keyed by id. Ids with no row are absent.
pub(crate) async fn students_by_id<I>(
    db: &DatabaseConnection,
    ids: I,
) -> Result<HashMap<i64, student::Model>>
where
    I: IntoIterator<Item = i64>,
{
    let ids: Vec<i64> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let students = Student::find()
        .filter(student::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(students.into_iter().map(|s| (s.id, s)).collect())
}

/// Roster ordering: last name, first name, then id. Rows whose student no longer
/// exists sort after all known students, by id.
pub(crate) fn compare_roster(
    a: Option<&student::Model>,
    a_id: i64,
    b: Option<&student::Model>,
    b_id: i64,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x
            .last_name
            .cmp(&y.last_name)
            .then_with(|| x.first_name.cmp(&y.first_name))
            .then(a_id.cmp(&b_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a_id.cmp(&b_id),
    }
}

/// Display name for a soft student reference.
#[must_use]
pub fn roster_name(student: Option<&student::Model>, student_id: i64) -> String {
    student.map_or_else(
        || format!("Unknown student #{student_id}"),
        student::Model::display_name,
    )
}
