//! Attendance business logic - Recording presence and summarising it per student.
//!
//! A record is keyed by (class, student, date). Saving the same key again updates the
//! existing row in place, so re-submitting a day's register never creates duplicates.
//! Summaries are computed only for students who have at least one record in the class.

use crate::{
    core::{
        optional_text, round_to,
        student::{compare_roster, roster_name, students_by_id},
    },
    entities::{Attendance, attendance, student},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::BTreeMap;
use tracing::debug;

/// One student's mark on a class register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceMark {
    /// Student being marked
    pub student_id: i64,
    /// Whether they attended
    pub present: bool,
    /// Optional remark
    pub note: Option<String>,
}

/// Presence totals for one student in one class.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSummary {
    /// Student the totals belong to
    pub student_id: i64,
    /// The student row, `None` if the id no longer resolves
    pub student: Option<student::Model>,
    /// Number of records marked present
    pub presents: u64,
    /// Number of records
    pub total: u64,
    /// `presents / total * 100`, rounded to one decimal place
    pub percent: f64,
}

impl AttendanceSummary {
    /// `"Last, First"`, or an unknown-student placeholder for a dangling id.
    #[must_use]
    pub fn display_name(&self) -> String {
        roster_name(self.student.as_ref(), self.student_id)
    }
}

/// Percentage of present records, rounded to one decimal. Zero records give 0.
#[must_use]
pub fn attendance_percent(presents: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    // Register sizes are far below f64's exact integer range.
    #[allow(clippy::cast_precision_loss)]
    let ratio = presents as f64 / total as f64;
    round_to(ratio * 100.0, 1)
}

/// Saves attendance for one student on one day, updating the existing record for
/// that (class, student, date) if there is one.
pub async fn record_attendance(
    db: &DatabaseConnection,
    class_id: i64,
    student_id: i64,
    date: NaiveDate,
    present: bool,
    note: Option<String>,
) -> Result<attendance::Model> {
    let note = optional_text(note);

    let existing = Attendance::find()
        .filter(attendance::Column::ClassId.eq(class_id))
        .filter(attendance::Column::StudentId.eq(student_id))
        .filter(attendance::Column::Date.eq(date))
        .one(db)
        .await?;

    if let Some(model) = existing {
        debug!(
            "Updating attendance {} (class {class_id}, student {student_id}, {date})",
            model.id
        );
        let mut active: attendance::ActiveModel = model.into();
        active.present = Set(present);
        active.note = Set(note);
        return active.update(db).await.map_err(Into::into);
    }

    let record = attendance::ActiveModel {
        class_id: Set(class_id),
        student_id: Set(student_id),
        date: Set(date),
        present: Set(present),
        note: Set(note),
        ..Default::default()
    };
    record.insert(db).await.map_err(Into::into)
}

/// Saves a whole register for one class and day. Each mark is upserted on its own.
pub async fn save_attendance_sheet(
    db: &DatabaseConnection,
    class_id: i64,
    date: NaiveDate,
    marks: &[AttendanceMark],
) -> Result<Vec<attendance::Model>> {
    let mut saved = Vec::with_capacity(marks.len());
    for mark in marks {
        saved.push(
            record_attendance(
                db,
                class_id,
                mark.student_id,
                date,
                mark.present,
                mark.note.clone(),
            )
            .await?,
        );
    }
    tracing::info!(
        "Saved {} attendance marks for class {class_id} on {date}",
        saved.len()
    );
    Ok(saved)
}

/// All attendance records of a class, ordered by date then student id.
pub async fn list_attendance_for_class(
    db: &DatabaseConnection,
    class_id: i64,
) -> Result<Vec<attendance::Model>> {
    Attendance::find()
        .filter(attendance::Column::ClassId.eq(class_id))
        .order_by_asc(attendance::Column::Date)
        .order_by_asc(attendance::Column::StudentId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Attendance records of a class on one day, ordered by student id.
pub async fn list_attendance_for_date(
    db: &DatabaseConnection,
    class_id: i64,
    date: NaiveDate,
) -> Result<Vec<attendance::Model>> {
    Attendance::find()
        .filter(attendance::Column::ClassId.eq(class_id))
        .filter(attendance::Column::Date.eq(date))
        .order_by_asc(attendance::Column::StudentId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Per-student presence totals for a class, in roster order.
///
/// This function backs the attendance report: every record of the class is
/// counted once, so re-saving a day never inflates the totals. The percentage is
/// `presents / total * 100` rounded to one decimal.
///
/// Students without any record in the class do not appear. Records whose student
/// was deleted are still counted and listed after every known student.
///
/// # Arguments
/// * `db` - Open store handle
/// * `class_id` - Class to summarise; an unknown class yields an empty list
pub async fn attendance_summary(
    db: &DatabaseConnection,
    class_id: i64,
) -> Result<Vec<AttendanceSummary>> {
    let records = list_attendance_for_class(db, class_id).await?;

    let mut totals: BTreeMap<i64, (u64, u64)> = BTreeMap::new();
    for record in &records {
        let entry = totals.entry(record.student_id).or_default();
        if record.present {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    let mut students = students_by_id(db, totals.keys().copied()).await?;

    let mut summaries: Vec<AttendanceSummary> = totals
        .into_iter()
        .map(|(student_id, (presents, total))| AttendanceSummary {
            student_id,
            student: students.remove(&student_id),
            presents,
            total,
            percent: attendance_percent(presents, total),
        })
        .collect();

    summaries.sort_by(|a, b| {
        compare_roster(a.student.as_ref(), a.student_id, b.student.as_ref(), b.student_id)
    });
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_attendance_percent() {
        assert_eq!(attendance_percent(3, 4), 75.0);
        assert_eq!(attendance_percent(2, 3), 66.7);
        assert_eq!(attendance_percent(0, 5), 0.0);
        assert_eq!(attendance_percent(0, 0), 0.0);
        assert_eq!(attendance_percent(1, 16), 6.2);
        assert_eq!(attendance_percent(3, 16), 18.8);
    }

    #[tokio::test]
    async fn test_resaving_same_day_updates_in_place() -> Result<()> {
        let (db, class, student) = setup_with_class_and_student().await?;

        let first = record_attendance(&db, class.id, student.id, day(4), true, None).await?;
        let second = record_attendance(
            &db,
            class.id,
            student.id,
            day(4),
            false,
            Some("left early".to_string()),
        )
        .await?;

        assert_eq!(first.id, second.id);
        assert_eq!(Attendance::find().count(&db).await?, 1);
        let stored = Attendance::find_by_id(first.id).one(&db).await?.unwrap();
        assert!(!stored.present);
        assert_eq!(stored.note.as_deref(), Some("left early"));
        Ok(())
    }

    #[tokio::test]
    async fn test_different_days_and_classes_are_separate_records() -> Result<()> {
        let (db, class, student) = setup_with_class_and_student().await?;
        let other = create_test_class(&db, "Other").await?;

        record_attendance(&db, class.id, student.id, day(4), true, None).await?;
        record_attendance(&db, class.id, student.id, day(5), true, None).await?;
        record_attendance(&db, other.id, student.id, day(4), true, None).await?;

        assert_eq!(list_attendance_for_class(&db, class.id).await?.len(), 2);
        assert_eq!(list_attendance_for_date(&db, class.id, day(4)).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_three_present_one_absent() -> Result<()> {
        let (db, class, student) = setup_with_class_and_student().await?;
        for (d, present) in [(4, true), (5, true), (6, false), (7, true)] {
            record_attendance(&db, class.id, student.id, day(d), present, None).await?;
        }

        let summary = attendance_summary(&db, class.id).await?;

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].student_id, student.id);
        assert_eq!(summary[0].presents, 3);
        assert_eq!(summary[0].total, 4);
        assert_eq!(summary[0].percent, 75.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_omits_students_without_records() -> Result<()> {
        let (db, class, student) = setup_with_class_and_student().await?;
        create_test_student(&db, "A002").await?;
        record_attendance(&db, class.id, student.id, day(4), false, None).await?;

        let summary = attendance_summary(&db, class.id).await?;

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].percent, 0.0);
        assert!(attendance_summary(&db, 999).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_roster_order_and_dangling_student() -> Result<()> {
        let db = setup_test_db().await?;
        let class = create_test_class(&db, "Roster").await?;
        let castro =
            crate::core::student::create_student(&db, "A001", "Ana", "Castro", None).await?;
        let brown =
            crate::core::student::create_student(&db, "A002", "Ben", "Brown", None).await?;

        let marks = vec![
            AttendanceMark {
                student_id: castro.id,
                present: true,
                note: None,
            },
            AttendanceMark {
                student_id: 4242,
                present: true,
                note: None,
            },
            AttendanceMark {
                student_id: brown.id,
                present: false,
                note: Some("sick".to_string()),
            },
        ];
        let saved = save_attendance_sheet(&db, class.id, day(11), &marks).await?;
        assert_eq!(saved.len(), 3);

        let summary = attendance_summary(&db, class.id).await?;
        let ids: Vec<i64> = summary.iter().map(|s| s.student_id).collect();

        assert_eq!(ids, vec![brown.id, castro.id, 4242]);
        assert_eq!(summary[0].display_name(), "Brown, Ben");
        assert_eq!(summary[2].display_name(), "Unknown student #4242");
        Ok(())
    }

    #[tokio::test]
    async fn test_resaving_sheet_keeps_one_row_per_student() -> Result<()> {
        let (db, class, student) = setup_with_class_and_student().await?;
        let mark = |present| AttendanceMark {
            student_id: student.id,
            present,
            note: None,
        };

        save_attendance_sheet(&db, class.id, day(12), &[mark(true)]).await?;
        save_attendance_sheet(&db, class.id, day(12), &[mark(false)]).await?;

        let rows = list_attendance_for_date(&db, class.id, day(12)).await?;
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].present);
        Ok(())
    }
}
