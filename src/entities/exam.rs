//! Exam entity - Metadata for an uploaded exam file.
//!
//! The file bytes live in the blob store under `file_name`; this row only records
//! where they are and what they belong to.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Exam record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exams")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Generated name of the artifact in the blob store
    pub file_name: String,
    /// Who uploaded the file; may be empty
    pub uploaded_by: String,
    /// Subject the exam is for, if any (soft reference)
    pub subject_id: Option<i64>,
    /// Class the exam is for, if any (soft reference)
    pub class_id: Option<i64>,
    /// When the file was uploaded
    pub upload_date: DateTimeUtc,
    /// Filename as the uploader supplied it, kept for display and download
    pub original_name: String,
}

/// `Exam` references are soft; no declared relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
