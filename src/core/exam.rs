//! Exam registry - Uploaded exam files and their metadata.
//!
//! The bytes go to a [`BlobStore`] under a generated name; the `exams` row records
//! that name next to the uploader's original filename and optional subject/class.
//! Writing the bytes must succeed before any metadata is written. Removing them on
//! delete is best-effort, while removing the metadata row is not.

use crate::{
    core::{class::class_names, required_text, subject::subject_names},
    entities::{Exam, exam},
    errors::{Error, Result},
    storage::BlobStore,
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, warn};

/// Optional narrowing for [`list_exams`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExamFilter {
    /// Only exams for this subject
    pub subject_id: Option<i64>,
    /// Only exams for this class
    pub class_id: Option<i64>,
}

/// An exam record joined with its subject and class names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamListing {
    /// The exam row
    pub exam: exam::Model,
    /// Subject name, `None` when unset or dangling
    pub subject_name: Option<String>,
    /// Class name, `None` when unset or dangling
    pub class_name: Option<String>,
}

/// Reduces an uploaded filename to characters that are safe in a blob name.
///
/// Directory components are dropped, anything outside `[A-Za-z0-9._-]` becomes `_`,
/// and runs of dots collapse to one.
#[must_use]
pub fn sanitize_file_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let mut sanitized = String::with_capacity(base.len());
    for c in base.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            c
        } else {
            '_'
        };
        if c == '.' && sanitized.ends_with('.') {
            continue;
        }
        sanitized.push(c);
    }

    if sanitized.trim_matches(['.', '_']).is_empty() {
        return "upload".to_string();
    }
    sanitized
}

/// Builds a stored name `exam_<timestamp>_<sanitized>` that is not yet taken in `blobs`.
pub(crate) fn stored_name_for(
    blobs: &dyn BlobStore,
    uploaded_at: DateTime<Utc>,
    original_name: &str,
) -> String {
    let stamp = uploaded_at.format("%Y%m%d%H%M%S%3f");
    let sanitized = sanitize_file_name(original_name);

    let mut candidate = format!("exam_{stamp}_{sanitized}");
    let mut suffix = 1u32;
    while blobs.exists(&candidate) {
        candidate = format!("exam_{stamp}_{suffix}_{sanitized}");
        suffix += 1;
    }
    candidate
}

/// Stores an exam file and registers it.
///
/// # Errors
/// - `InvalidInput` if `original_name` is blank
/// - `ArtifactIo` if the bytes cannot be stored; no row is written in that case
/// - `Database` if the row cannot be written; the stored bytes are then removed
///   best-effort
pub async fn upload_exam(
    db: &DatabaseConnection,
    blobs: &dyn BlobStore,
    bytes: &[u8],
    original_name: &str,
    uploaded_by: &str,
    subject_id: Option<i64>,
    class_id: Option<i64>,
) -> Result<exam::Model> {
    let original_name = required_text(original_name, "Original file name")?;
    let uploaded_at = Utc::now();
    let file_name = stored_name_for(blobs, uploaded_at, &original_name);

    blobs.put(&file_name, bytes)?;

    let record = exam::ActiveModel {
        file_name: Set(file_name.clone()),
        uploaded_by: Set(uploaded_by.trim().to_string()),
        subject_id: Set(subject_id),
        class_id: Set(class_id),
        upload_date: Set(uploaded_at),
        original_name: Set(original_name),
        ..Default::default()
    };

    match record.insert(db).await {
        Ok(model) => {
            info!("Registered exam {} as {}", model.id, model.file_name);
            Ok(model)
        }
        Err(e) => {
            if let Err(cleanup) = blobs.delete(&file_name) {
                warn!("Could not remove orphaned artifact {file_name}: {cleanup}");
            }
            Err(e.into())
        }
    }
}

/// Finds an exam record by id.
pub async fn get_exam(db: &DatabaseConnection, exam_id: i64) -> Result<Option<exam::Model>> {
    Exam::find_by_id(exam_id).one(db).await.map_err(Into::into)
}

/// Lists exams, newest upload first, with subject and class names resolved.
pub async fn list_exams(db: &DatabaseConnection, filter: ExamFilter) -> Result<Vec<ExamListing>> {
    let mut query = Exam::find();
    if let Some(subject_id) = filter.subject_id {
        query = query.filter(exam::Column::SubjectId.eq(subject_id));
    }
    if let Some(class_id) = filter.class_id {
        query = query.filter(exam::Column::ClassId.eq(class_id));
    }
    let exams = query
        .order_by_desc(exam::Column::UploadDate)
        .order_by_desc(exam::Column::Id)
        .all(db)
        .await?;

    let subjects = subject_names(db).await?;
    let classes = class_names(db).await?;

    Ok(exams
        .into_iter()
        .map(|exam| ExamListing {
            subject_name: exam.subject_id.and_then(|id| subjects.get(&id).cloned()),
            class_name: exam.class_id.and_then(|id| classes.get(&id).cloned()),
            exam,
        })
        .collect())
}

/// Loads an exam record together with its stored bytes.
pub async fn fetch_exam_artifact(
    db: &DatabaseConnection,
    blobs: &dyn BlobStore,
    exam_id: i64,
) -> Result<(exam::Model, Vec<u8>)> {
    let exam = get_exam(db, exam_id).await?.ok_or(Error::NotFound {
        entity: "Exam",
        id: exam_id,
    })?;
    let bytes = blobs.get(&exam.file_name)?;
    Ok((exam, bytes))
}

/// Deletes an exam: its artifact best-effort, then its row.
///
/// A missing or unremovable artifact is logged and ignored, so an exam whose file
/// was already cleaned up by hand can still be removed from the registry. Failing
/// to remove the row is returned to the caller.
///
/// # Errors
/// - `NotFound` if no exam has this id
/// - `Database` if the row cannot be read or removed
pub async fn delete_exam(
    db: &DatabaseConnection,
    blobs: &dyn BlobStore,
    exam_id: i64,
) -> Result<()> {
    let exam = get_exam(db, exam_id).await?.ok_or(Error::NotFound {
        entity: "Exam",
        id: exam_id,
    })?;

    if let Err(e) = blobs.delete(&exam.file_name) {
        warn!("Ignoring artifact removal failure for exam {exam_id}: {e}");
    }

    let result = Exam::delete_by_id(exam_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Exam",
            id: exam_id,
        });
    }
    info!("Deleted exam {exam_id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::TimeZone;
    use sea_orm::{ConnectionTrait, PaginatorTrait};

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Parcial 1.pdf"), "Parcial_1.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\exams\\final..docx"), "final.docx");
        assert_eq!(sanitize_file_name("  "), "upload");
        assert_eq!(sanitize_file_name("..."), "upload");
        assert_eq!(sanitize_file_name("examen-ñ.png"), "examen-_.png");
    }

    #[test]
    fn test_stored_name_avoids_collisions() -> Result<()> {
        let blobs = MemoryBlobStore::default();
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        let first = stored_name_for(&blobs, at, "math.pdf");
        assert_eq!(first, "exam_20240506070809000_math.pdf");

        blobs.put(&first, b"x")?;
        let second = stored_name_for(&blobs, at, "math.pdf");
        assert_eq!(second, "exam_20240506070809000_1_math.pdf");
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_stores_bytes_and_metadata() -> Result<()> {
        let (db, class, _student) = setup_with_class_and_student().await?;
        let blobs = MemoryBlobStore::default();

        let exam = upload_exam(
            &db,
            &blobs,
            b"%PDF-1.4 exam",
            "Final Exam.pdf",
            "Prof. Pérez",
            None,
            Some(class.id),
        )
        .await?;

        assert!(exam.file_name.starts_with("exam_"));
        assert!(exam.file_name.ends_with("_Final_Exam.pdf"));
        assert_eq!(exam.original_name, "Final Exam.pdf");
        assert_eq!(exam.uploaded_by, "Prof. Pérez");
        assert_eq!(blobs.get(&exam.file_name)?, b"%PDF-1.4 exam");

        let (fetched, bytes) = fetch_exam_artifact(&db, &blobs, exam.id).await?;
        assert_eq!(fetched, exam);
        assert_eq!(bytes, b"%PDF-1.4 exam");
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_failure_writes_no_metadata() -> Result<()> {
        let db = setup_test_db().await?;

        let result = upload_exam(&db, &FailingBlobStore, b"data", "a.pdf", "", None, None).await;

        assert!(matches!(result, Err(Error::ArtifactIo { .. })));
        assert_eq!(Exam::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_insert_removes_stored_bytes() -> Result<()> {
        let db = setup_test_db().await?;
        let blobs = MemoryBlobStore::default();
        db.execute_unprepared("DROP TABLE exams").await?;

        let result = upload_exam(&db, &blobs, b"data", "a.pdf", "", None, None).await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(blobs.stored_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_exams_with_names_and_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let blobs = MemoryBlobStore::default();
        let subject = create_test_subject(&db, "Biology").await?;
        let class = create_test_class(&db, "2nd Year").await?;

        let plain = upload_exam(&db, &blobs, b"1", "a.pdf", "", None, None).await?;
        let tagged =
            upload_exam(&db, &blobs, b"2", "b.pdf", "T", Some(subject.id), Some(class.id)).await?;
        let dangling = upload_exam(&db, &blobs, b"3", "c.pdf", "T", Some(999), None).await?;

        let all = list_exams(&db, ExamFilter::default()).await?;
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].exam.id, dangling.id);
        assert_eq!(all[0].subject_name, None);

        let listing = all.iter().find(|l| l.exam.id == tagged.id).unwrap();
        assert_eq!(listing.subject_name.as_deref(), Some("Biology"));
        assert_eq!(listing.class_name.as_deref(), Some("2nd Year"));

        let plain_listing = all.iter().find(|l| l.exam.id == plain.id).unwrap();
        assert_eq!(plain_listing.subject_name, None);
        assert_eq!(plain_listing.class_name, None);

        let for_class = list_exams(
            &db,
            ExamFilter {
                class_id: Some(class.id),
                ..ExamFilter::default()
            },
        )
        .await?;
        assert_eq!(for_class.len(), 1);
        assert_eq!(for_class[0].exam.id, tagged.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_removes_artifact_and_row() -> Result<()> {
        let db = setup_test_db().await?;
        let blobs = MemoryBlobStore::default();
        let exam = upload_exam(&db, &blobs, b"x", "a.pdf", "", None, None).await?;

        delete_exam(&db, &blobs, exam.id).await?;

        assert!(!blobs.exists(&exam.file_name));
        assert!(get_exam(&db, exam.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_with_missing_artifact_still_succeeds() -> Result<()> {
        let db = setup_test_db().await?;
        let blobs = MemoryBlobStore::default();
        let exam = upload_exam(&db, &blobs, b"x", "a.pdf", "", None, None).await?;
        blobs.delete(&exam.file_name)?;

        delete_exam(&db, &blobs, exam.id).await?;

        assert!(get_exam(&db, exam.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_surfaces_database_failure() -> Result<()> {
        let db = setup_test_db().await?;
        let blobs = MemoryBlobStore::default();
        let exam = upload_exam(&db, &blobs, b"x", "a.pdf", "", None, None).await?;
        db.execute_unprepared("DROP TABLE exams").await?;

        let result = delete_exam(&db, &blobs, exam.id).await;

        assert!(matches!(result, Err(Error::Database(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_unknown_exam_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_exam(&db, &MemoryBlobStore::default(), 42).await;
        assert!(matches!(result, Err(Error::NotFound { id: 42, .. })));
        Ok(())
    }
}
