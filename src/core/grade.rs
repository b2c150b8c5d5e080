//! Grade business logic - Recording marks and computing weighted averages.
//!
//! Grade entries are append-only. The per-student average in a class is
//! `sum(grade * weight) / sum(weight)`; when the weights add up to zero the average
//! is undefined and reported as `None` rather than as a division error.

use crate::{
    core::{
        optional_text, round_to,
        student::{compare_roster, roster_name, students_by_id},
    },
    entities::{Grade, grade, student},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::BTreeMap;

/// Weight used when the caller does not give one.
pub const DEFAULT_GRADE_WEIGHT: f64 = 1.0;

/// A grade entry with the student's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeListing {
    /// The entry
    pub entry: grade::Model,
    /// `"Last, First"`, or a placeholder if the student no longer exists
    pub student_name: String,
}

/// Weighted average for one student in one class.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeAverage {
    /// Student the average belongs to
    pub student_id: i64,
    /// The student row, `None` if the id no longer resolves
    pub student: Option<student::Model>,
    /// Number of grade entries considered
    pub entries: usize,
    /// Sum of the entries' weights
    pub total_weight: f64,
    /// Weighted average rounded to two decimals; `None` when `total_weight` is zero
    pub average: Option<f64>,
}

impl GradeAverage {
    /// `"Last, First"`, or an unknown-student placeholder for a dangling id.
    #[must_use]
    pub fn display_name(&self) -> String {
        roster_name(self.student.as_ref(), self.student_id)
    }
}

/// `sum(grade * weight) / sum(weight)` over `(grade, weight)` pairs.
///
/// Returns `None` when there are no entries or the weights do not add up to a
/// positive finite number.
#[must_use]
pub fn weighted_average<I>(entries: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (weighted_sum, total_weight) = entries
        .into_iter()
        .fold((0.0, 0.0), |(sum, weights), (grade, weight)| {
            (grade.mul_add(weight, sum), weights + weight)
        });

    if total_weight <= 0.0 || !total_weight.is_finite() {
        return None;
    }
    Some(weighted_sum / total_weight)
}

/// Records a grade entry timestamped now.
///
/// `weight` defaults to [`DEFAULT_GRADE_WEIGHT`]. A zero weight is accepted; a
/// negative or non-finite weight, or a non-finite grade, is rejected.
pub async fn record_grade(
    db: &DatabaseConnection,
    class_id: i64,
    student_id: i64,
    grade: f64,
    weight: Option<f64>,
    description: Option<String>,
) -> Result<grade::Model> {
    let weight = weight.unwrap_or(DEFAULT_GRADE_WEIGHT);

    if !grade.is_finite() {
        return Err(Error::InvalidInput {
            message: format!("Grade must be a finite number, got {grade}"),
        });
    }
    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::InvalidInput {
            message: format!("Weight must be zero or positive, got {weight}"),
        });
    }

    let entry = grade::ActiveModel {
        class_id: Set(class_id),
        student_id: Set(student_id),
        date: Set(chrono::Utc::now()),
        grade: Set(grade),
        weight: Set(weight),
        description: Set(optional_text(description)),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// All entries of a class with student names, newest first.
pub async fn list_grades_for_class(
    db: &DatabaseConnection,
    class_id: i64,
) -> Result<Vec<GradeListing>> {
    let entries = Grade::find()
        .filter(grade::Column::ClassId.eq(class_id))
        .order_by_desc(grade::Column::Date)
        .order_by_desc(grade::Column::Id)
        .all(db)
        .await?;

    let students = students_by_id(db, entries.iter().map(|e| e.student_id)).await?;

    Ok(entries
        .into_iter()
        .map(|entry| GradeListing {
            student_name: roster_name(students.get(&entry.student_id), entry.student_id),
            entry,
        })
        .collect())
}

/// Entries of one student in one class, oldest first.
pub async fn list_grades_for_student(
    db: &DatabaseConnection,
    class_id: i64,
    student_id: i64,
) -> Result<Vec<grade::Model>> {
    Grade::find()
        .filter(grade::Column::ClassId.eq(class_id))
        .filter(grade::Column::StudentId.eq(student_id))
        .order_by_asc(grade::Column::Date)
        .order_by_asc(grade::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Weighted average per student for a class, in roster order.
///
/// This function backs the grades report. Each student's entries are reduced with
/// [`weighted_average`] and rounded to two decimals. When every entry of a student
/// has weight zero the average is `None`, which the caller shows as "no data".
///
/// Students without entries in the class do not appear.
pub async fn grade_averages(db: &DatabaseConnection, class_id: i64) -> Result<Vec<GradeAverage>> {
    let entries = Grade::find()
        .filter(grade::Column::ClassId.eq(class_id))
        .all(db)
        .await?;

    let mut by_student: BTreeMap<i64, Vec<(f64, f64)>> = BTreeMap::new();
    for entry in &entries {
        by_student
            .entry(entry.student_id)
            .or_default()
            .push((entry.grade, entry.weight));
    }

    let mut students = students_by_id(db, by_student.keys().copied()).await?;

    let mut averages: Vec<GradeAverage> = by_student
        .into_iter()
        .map(|(student_id, pairs)| GradeAverage {
            student_id,
            student: students.remove(&student_id),
            entries: pairs.len(),
            total_weight: pairs.iter().map(|(_, w)| w).sum(),
            average: weighted_average(pairs).map(|avg| round_to(avg, 2)),
        })
        .collect();

    averages.sort_by(|a, b| {
        compare_roster(a.student.as_ref(), a.student_id, b.student.as_ref(), b.student_id)
    });
    Ok(averages)
}
