//! Attendance entity - Whether a student was present in a class on a given day.
//!
//! There is at most one row per (`class_id`, `student_id`, `date`). This is kept by
//! the upsert in `core::attendance`, not by a table constraint.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Class the record belongs to (soft reference)
    pub class_id: i64,
    /// Student the record is about (soft reference)
    pub student_id: i64,
    /// Calendar day of the session
    pub date: Date,
    /// Whether the student attended
    pub present: bool,
    /// Optional remark (e.g. "late", "excused")
    pub note: Option<String>,
}

/// `Attendance` references are soft; no declared relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
