//! Dashboard counts.

use crate::{
    entities::{Attendance, Class, Exam, Grade, Student, Subject, Teacher},
    errors::Result,
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

/// Row counts of every table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overview {
    /// Students on record
    pub students: u64,
    /// Teachers on record
    pub teachers: u64,
    /// Subjects on record
    pub subjects: u64,
    /// Classes on record
    pub classes: u64,
    /// Attendance records
    pub attendance_records: u64,
    /// Grade entries
    pub grade_entries: u64,
    /// Registered exam files
    pub exams: u64,
}

/// Counts the rows of every table.
pub async fn overview(db: &DatabaseConnection) -> Result<Overview> {
    Ok(Overview {
        students: Student::find().count(db).await?,
        teachers: Teacher::find().count(db).await?,
        subjects: Subject::find().count(db).await?,
        classes: Class::find().count(db).await?,
        attendance_records: Attendance::find().count(db).await?,
        grade_entries: Grade::find().count(db).await?,
        exams: Exam::find().count(db).await?,
    })
}
