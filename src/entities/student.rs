//! Student entity - A pupil enrolled at the school.
//!
//! Students are identified to people by their `student_code` (e.g. "A001"),
//! which is unique across the table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier for the student
    #[sea_orm(primary_key)]
    pub id: i64,
    /// School-assigned code, unique per student
    #[sea_orm(unique)]
    pub student_code: String,
    /// Given name
    pub first_name: String,
    /// Family name, used first in display ordering
    pub last_name: String,
    /// Free-text notes
    pub extra: Option<String>,
}

impl Model {
    /// Display form used in listings: `"Last, First"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Students are referenced by id only; no declared relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
