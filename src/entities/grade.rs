//! Grade entity - One mark awarded to a student in a class.
//!
//! Entries are append-only. `weight` scales the entry in the weighted average;
//! `grade` is expected in 0-100 but the table does not enforce it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Grade entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grades")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Class the mark was given in (soft reference)
    pub class_id: i64,
    /// Student who received the mark (soft reference)
    pub student_id: i64,
    /// When the entry was recorded
    pub date: DateTimeUtc,
    /// The mark itself
    pub grade: f64,
    /// Coefficient applied in the weighted average
    pub weight: f64,
    /// Label such as "Midterm 1"
    pub description: Option<String>,
}

/// `Grade` references are soft; no declared relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
