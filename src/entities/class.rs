//! Class entity - A teaching group that attendance and grades are recorded against.
//!
//! A class may name a subject and a teacher, but neither is required and neither
//! is owned: deleting the subject or teacher leaves the class with a dangling id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Class database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    /// Unique identifier for the class
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Subject taught, if any (soft reference to `subjects.id`)
    pub subject_id: Option<i64>,
    /// Teacher in charge, if any (soft reference to `teachers.id`)
    pub teacher_id: Option<i64>,
    /// Display name (e.g. "3rd Year - A")
    pub class_name: String,
    /// Free-text timetable description
    pub schedule: Option<String>,
}

/// `Class` references are soft; no declared relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
