//! Class business logic - Handles all class-related operations.
//!
//! A class may point at a subject and a teacher through optional soft references.
//! Nothing here checks that those ids exist, and listings that show subject or
//! teacher names resolve missing ones to `None`.

use crate::{
    core::{optional_text, required_text, subject::subject_names},
    entities::{Class, Teacher, class},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashMap;

/// A class joined with the names of its subject and teacher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassListing {
    /// The class row
    pub class: class::Model,
    /// Subject name, `None` if the class has no subject or it no longer exists
    pub subject_name: Option<String>,
    /// Teacher name, `None` if the class has no teacher or they no longer exist
    pub teacher_name: Option<String>,
}

/// Retrieves all classes ordered by class name.
pub async fn list_classes(db: &DatabaseConnection) -> Result<Vec<class::Model>> {
    Class::find()
        .order_by_asc(class::Column::ClassName)
        .order_by_asc(class::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the classes that reference a subject.
pub async fn list_classes_for_subject(
    db: &DatabaseConnection,
    subject_id: i64,
) -> Result<Vec<class::Model>> {
    Class::find()
        .filter(class::Column::SubjectId.eq(subject_id))
        .order_by_asc(class::Column::ClassName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the classes that reference a teacher.
pub async fn list_classes_for_teacher(
    db: &DatabaseConnection,
    teacher_id: i64,
) -> Result<Vec<class::Model>> {
    Class::find()
        .filter(class::Column::TeacherId.eq(teacher_id))
        .order_by_asc(class::Column::ClassName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all classes with their subject and teacher names resolved.
pub async fn list_classes_with_names(db: &DatabaseConnection) -> Result<Vec<ClassListing>> {
    let classes = list_classes(db).await?;
    let subjects = subject_names(db).await?;
    let teachers: HashMap<i64, String> = Teacher::find()
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();

    Ok(classes
        .into_iter()
        .map(|class| ClassListing {
            subject_name: class.subject_id.and_then(|id| subjects.get(&id).cloned()),
            teacher_name: class.teacher_id.and_then(|id| teachers.get(&id).cloned()),
            class,
        })
        .collect())
}

/// Finds a class by id.
pub async fn get_class_by_id(
    db: &DatabaseConnection,
    class_id: i64,
) -> Result<Option<class::Model>> {
    Class::find_by_id(class_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a class. Subject and teacher ids are stored as given.
pub async fn create_class(
    db: &DatabaseConnection,
    class_name: &str,
    subject_id: Option<i64>,
    teacher_id: Option<i64>,
    schedule: Option<String>,
) -> Result<class::Model> {
    let class = class::ActiveModel {
        class_name: Set(required_text(class_name, "Class name")?),
        subject_id: Set(subject_id),
        teacher_id: Set(teacher_id),
        schedule: Set(optional_text(schedule)),
        ..Default::default()
    };

    class.insert(db).await.map_err(Into::into)
}

/// Replaces every field of a class.
pub async fn update_class(
    db: &DatabaseConnection,
    class_id: i64,
    class_name: &str,
    subject_id: Option<i64>,
    teacher_id: Option<i64>,
    schedule: Option<String>,
) -> Result<class::Model> {
    let class_name = required_text(class_name, "Class name")?;

    let mut class: class::ActiveModel = Class::find_by_id(class_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Class",
            id: class_id,
        })?
        .into();

    class.class_name = Set(class_name);
    class.subject_id = Set(subject_id);
    class.teacher_id = Set(teacher_id);
    class.schedule = Set(optional_text(schedule));

    class.update(db).await.map_err(Into::into)
}

/// Deletes a class. Its attendance, grade and exam rows are kept.
pub async fn delete_class(db: &DatabaseConnection, class_id: i64) -> Result<()> {
    let result = Class::delete_by_id(class_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Class",
            id: class_id,
        });
    }
    Ok(())
}

/// All class names keyed by id, for resolving soft references in listings.
pub(crate) async fn class_names(db: &DatabaseConnection) -> Result<HashMap<i64, String>> {
    Ok(Class::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.class_name))
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{subject, teacher};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_class_without_subject_or_teacher() -> Result<()> {
        let db = setup_test_db().await?;

        let class = create_class(&db, "3rd Year - A", None, None, Some(" ".to_string())).await?;

        assert_eq!(class.class_name, "3rd Year - A");
        assert_eq!(class.subject_id, None);
        assert_eq!(class.teacher_id, None);
        assert_eq!(class.schedule, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_class_rejects_blank_name() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_class(&db, "", None, None, None).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_classes_with_names_resolves_and_tolerates_dangling() -> Result<()> {
        let db = setup_test_db().await?;
        let math = create_test_subject(&db, "Mathematics").await?;
        let lopez = create_test_teacher(&db, "A. Lopez").await?;
        let art = create_test_subject(&db, "Art").await?;

        create_class(
            &db,
            "A - Math",
            Some(math.id),
            Some(lopez.id),
            Some("Mon 9:00".to_string()),
        )
        .await?;
        create_class(&db, "B - Art", Some(art.id), Some(999), None).await?;
        subject::delete_subject(&db, art.id).await?;

        let listings = list_classes_with_names(&db).await?;

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].subject_name.as_deref(), Some("Mathematics"));
        assert_eq!(listings[0].teacher_name.as_deref(), Some("A. Lopez"));
        assert_eq!(listings[1].class.class_name, "B - Art");
        assert_eq!(listings[1].subject_name, None);
        assert_eq!(listings[1].teacher_name, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_classes_by_reference() -> Result<()> {
        let db = setup_test_db().await?;
        let math = create_test_subject(&db, "Mathematics").await?;
        let lopez = create_test_teacher(&db, "A. Lopez").await?;

        create_class(&db, "Algebra", Some(math.id), None, None).await?;
        create_class(&db, "Geometry", Some(math.id), Some(lopez.id), None).await?;
        create_class(&db, "Homeroom", None, Some(lopez.id), None).await?;

        let by_subject = list_classes_for_subject(&db, math.id).await?;
        assert_eq!(by_subject.len(), 2);
        assert_eq!(by_subject[0].class_name, "Algebra");

        let by_teacher = list_classes_for_teacher(&db, lopez.id).await?;
        let names: Vec<&str> = by_teacher.iter().map(|c| c.class_name.as_str()).collect();
        assert_eq!(names, vec!["Geometry", "Homeroom"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_class() -> Result<()> {
        let db = setup_test_db().await?;
        let class = create_test_class(&db, "5th Year").await?;
        let teacher = teacher::create_teacher(&db, "E. Park", None).await?;

        let updated = update_class(
            &db,
            class.id,
            "5th Year - A",
            None,
            Some(teacher.id),
            Some("Tue 10:00".to_string()),
        )
        .await?;
        assert_eq!(updated.class_name, "5th Year - A");
        assert_eq!(updated.teacher_id, Some(teacher.id));
        assert_eq!(updated.schedule.as_deref(), Some("Tue 10:00"));

        delete_class(&db, class.id).await?;
        assert!(get_class_by_id(&db, class.id).await?.is_none());
        assert!(matches!(
            update_class(&db, class.id, "x", None, None, None).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }
}
