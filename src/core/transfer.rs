//! Import/export adapter - CSV in for students, CSV out for any table.
//!
//! Import checks the header first and refuses the whole file if a required column
//! is missing. After that every row is inserted on its own: a duplicate code is
//! skipped and any other bad row is recorded as failed, and neither stops the
//! rows after it. Export writes every row of one table with a header of its
//! column names.

use crate::{
    core::student::create_student,
    entities::{
        Attendance, Class, Exam, Grade, Student, Subject, Teacher, attendance, class, exam, grade,
        student, subject, teacher,
    },
    errors::{Error, Result},
};
use csv::{ReaderBuilder, StringRecord, Writer};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use tracing::{debug, info};

/// Columns an import file must have.
pub const REQUIRED_IMPORT_COLUMNS: [&str; 3] = ["student_code", "first_name", "last_name"];

/// Optional import column copied into `Student::extra`.
pub const OPTIONAL_IMPORT_COLUMN: &str = "extra";

/// What happened to one data row of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    /// A new student was created
    Inserted {
        /// Id of the new student
        id: i64,
    },
    /// The code already exists; the row was ignored
    SkippedDuplicate,
    /// The row could not be imported
    Failed {
        /// Why
        reason: String,
    },
}

/// Outcome of one import row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    /// 1-based data row number (the header is not counted)
    pub row: usize,
    /// Code as read from the row (may be empty for failed rows)
    pub student_code: String,
    /// What happened
    pub status: RowStatus,
}

/// Per-row results of a student import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// One entry per data row, in file order
    pub outcomes: Vec<RowOutcome>,
}

impl ImportReport {
    fn count(&self, pred: impl Fn(&RowStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    /// Number of students created.
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.count(|s| matches!(s, RowStatus::Inserted { .. }))
    }

    /// Number of rows skipped because the code already existed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, RowStatus::SkippedDuplicate))
    }

    /// Number of rows that failed for any other reason.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, RowStatus::Failed { .. }))
    }

    /// The aggregate notification shown after an import.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Students imported (duplicates skipped): {} added, {} skipped, {} failed",
            self.inserted(),
            self.skipped(),
            self.failed()
        )
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn field(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or_default().trim().to_string()
}

/// Imports students from CSV with columns `student_code, first_name, last_name`
/// (and optionally `extra`). Additional columns are ignored.
///
/// Columns are found by header name, so their order in the file does not matter.
/// Each row is a separate insert: a code that already exists is reported as
/// `SkippedDuplicate` and rows before and after it are still written. Re-importing
/// the same file therefore only adds the students it did not add before.
///
/// # Errors
/// `MissingColumns` if the header lacks a required column, before anything is
/// written. Row-level problems never fail the import; see [`ImportReport`].
pub async fn import_students_csv<R: Read>(
    db: &DatabaseConnection,
    reader: R,
) -> Result<ImportReport> {
    let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let missing: Vec<String> = REQUIRED_IMPORT_COLUMNS
        .iter()
        .filter(|name| column_index(&headers, name).is_none())
        .map(|name| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns { missing });
    }

    // Required columns were checked above.
    let [code_idx, first_idx, last_idx] =
        REQUIRED_IMPORT_COLUMNS.map(|name| column_index(&headers, name).unwrap_or_default());
    let extra_idx = column_index(&headers, OPTIONAL_IMPORT_COLUMN);

    let mut report = ImportReport::default();
    for (offset, record) in csv_reader.records().enumerate() {
        let row = offset + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Import row {row} unreadable: {e}");
                report.outcomes.push(RowOutcome {
                    row,
                    student_code: String::new(),
                    status: RowStatus::Failed {
                        reason: e.to_string(),
                    },
                });
                continue;
            }
        };

        let student_code = field(&record, code_idx);
        let extra = extra_idx.map(|idx| field(&record, idx));
        let status = match create_student(
            db,
            &student_code,
            &field(&record, first_idx),
            &field(&record, last_idx),
            extra,
        )
        .await
        {
            Ok(student) => RowStatus::Inserted { id: student.id },
            Err(Error::DuplicateKey { .. }) => {
                debug!("Import row {row}: student code {student_code} exists, skipping");
                RowStatus::SkippedDuplicate
            }
            Err(e) => {
                debug!("Import row {row} failed: {e}");
                RowStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        report.outcomes.push(RowOutcome {
            row,
            student_code,
            status,
        });
    }

    info!("{}", report.message());
    Ok(report)
}

/// The sample import file offered to users: a header and two example students.
pub fn student_import_template() -> Result<Vec<u8>> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(REQUIRED_IMPORT_COLUMNS)?;
    wtr.write_record(["A001", "Juan", "Pérez"])?;
    wtr.write_record(["A002", "María", "González"])?;
    wtr.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// The exportable tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// `students`
    Students,
    /// `teachers`
    Teachers,
    /// `subjects`
    Subjects,
    /// `classes`
    Classes,
    /// `attendance`
    Attendance,
    /// `grades`
    Grades,
    /// `exams`
    Exams,
}

impl Table {
    /// Every table, in the order they are offered for export.
    pub const ALL: [Self; 7] = [
        Self::Students,
        Self::Teachers,
        Self::Subjects,
        Self::Classes,
        Self::Attendance,
        Self::Grades,
        Self::Exams,
    ];

    /// Database table name.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::Subjects => "subjects",
            Self::Classes => "classes",
            Self::Attendance => "attendance",
            Self::Grades => "grades",
            Self::Exams => "exams",
        }
    }

    /// Entity name as used in the domain model.
    #[must_use]
    pub const fn entity_name(self) -> &'static str {
        match self {
            Self::Students => "Student",
            Self::Teachers => "Teacher",
            Self::Subjects => "Subject",
            Self::Classes => "Class",
            Self::Attendance => "AttendanceRecord",
            Self::Grades => "GradeEntry",
            Self::Exams => "ExamRecord",
        }
    }

    /// Column names written as the export header.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Students => &["id", "student_code", "first_name", "last_name", "extra"],
            Self::Teachers => &["id", "name", "email"],
            Self::Subjects => &["id", "name", "description"],
            Self::Classes => &["id", "subject_id", "teacher_id", "class_name", "schedule"],
            Self::Attendance => &["id", "class_id", "student_id", "date", "present", "note"],
            Self::Grades => &[
                "id",
                "class_id",
                "student_id",
                "date",
                "grade",
                "weight",
                "description",
            ],
            Self::Exams => &[
                "id",
                "file_name",
                "uploaded_by",
                "subject_id",
                "class_id",
                "upload_date",
                "original_name",
            ],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for Table {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|table| {
                let entity = table.entity_name().to_ascii_lowercase();
                wanted == table.table_name()
                    || wanted == entity
                    || wanted.strip_suffix('s') == Some(entity.as_str())
            })
            .ok_or_else(|| Error::UnknownTable {
                name: s.to_string(),
            })
    }
}

/// One exported CSV record.
trait CsvRow {
    fn csv_record(&self) -> Vec<String>;
}

fn opt_text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

/// REAL columns keep a decimal point, e.g. `80.0`.
fn real(value: f64) -> String {
    format!("{value:?}")
}

fn opt_id(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvRow for student::Model {
    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.student_code.clone(),
            self.first_name.clone(),
            self.last_name.clone(),
            opt_text(self.extra.as_ref()),
        ]
    }
}

impl CsvRow for teacher::Model {
    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt_text(self.email.as_ref()),
        ]
    }
}

impl CsvRow for subject::Model {
    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt_text(self.description.as_ref()),
        ]
    }
}

impl CsvRow for class::Model {
    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            opt_id(self.subject_id),
            opt_id(self.teacher_id),
            self.class_name.clone(),
            opt_text(self.schedule.as_ref()),
        ]
    }
}

impl CsvRow for attendance::Model {
    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.class_id.to_string(),
            self.student_id.to_string(),
            self.date.format("%Y-%m-%d").to_string(),
            if self.present { "1" } else { "0" }.to_string(),
            opt_text(self.note.as_ref()),
        ]
    }
}

impl CsvRow for grade::Model {
    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.class_id.to_string(),
            self.student_id.to_string(),
            self.date.to_rfc3339(),
            real(self.grade),
            real(self.weight),
            opt_text(self.description.as_ref()),
        ]
    }
}

impl CsvRow for exam::Model {
    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.file_name.clone(),
            self.uploaded_by.clone(),
            opt_id(self.subject_id),
            opt_id(self.class_id),
            self.upload_date.to_rfc3339(),
            self.original_name.clone(),
        ]
    }
}

fn write_csv<T: CsvRow>(columns: &[&str], rows: &[T]) -> Result<Vec<u8>> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(columns)?;
    for row in rows {
        wtr.write_record(row.csv_record())?;
    }
    wtr.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Dumps every row of `table` as CSV, ordered by id, with a header row.
pub async fn export_table(db: &DatabaseConnection, table: Table) -> Result<Vec<u8>> {
    let columns = table.columns();
    let bytes = match table {
        Table::Students => write_csv(
            columns,
            &Student::find()
                .order_by_asc(student::Column::Id)
                .all(db)
                .await?,
        ),
        Table::Teachers => write_csv(
            columns,
            &Teacher::find()
                .order_by_asc(teacher::Column::Id)
                .all(db)
                .await?,
        ),
        Table::Subjects => write_csv(
            columns,
            &Subject::find()
                .order_by_asc(subject::Column::Id)
                .all(db)
                .await?,
        ),
        Table::Classes => write_csv(
            columns,
            &Class::find().order_by_asc(class::Column::Id).all(db).await?,
        ),
        Table::Attendance => write_csv(
            columns,
            &Attendance::find()
                .order_by_asc(attendance::Column::Id)
                .all(db)
                .await?,
        ),
        Table::Grades => write_csv(
            columns,
            &Grade::find().order_by_asc(grade::Column::Id).all(db).await?,
        ),
        Table::Exams => write_csv(
            columns,
            &Exam::find().order_by_asc(exam::Column::Id).all(db).await?,
        ),
    }?;
    debug!("Exported table {table} ({} bytes)", bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]
    use super::*;
    use crate::core::{attendance::record_attendance, grade::record_grade, student, teacher};
    use crate::test_utils::*;
    use chrono::NaiveDate;

    fn parse_export(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_reader(bytes);
        let headers = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (headers, rows)
    }

    #[tokio::test]
    async fn test_import_students() -> Result<()> {
        let db = setup_test_db().await?;
        let csv = "student_code,first_name,last_name\nA001,Juan,Pérez\nA002,María,González\n";

        let report = import_students_csv(&db, csv.as_bytes()).await?;

        assert_eq!(report.inserted(), 2);
        assert_eq!(report.outcomes[1].student_code, "A002");
        let maria = student::get_student_by_code(&db, "A002").await?.unwrap();
        assert_eq!(maria.last_name, "González");
        Ok(())
    }

    #[tokio::test]
    async fn test_import_skips_existing_and_repeated_codes() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "A001").await?;
        let csv = "student_code,first_name,last_name\n\
                   A001,Juan,Pérez\n\
                   A002,María,González\n\
                   A002,Mario,González\n";

        let report = import_students_csv(&db, csv.as_bytes()).await?;

        assert_eq!(report.inserted(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.outcomes[0].status, RowStatus::SkippedDuplicate);
        assert_eq!(student::count_students(&db).await?, 2);

        let exported = export_table(&db, Table::Students).await?;
        let (_, rows) = parse_export(&exported);
        assert_eq!(rows.iter().filter(|r| r[1] == "A001").count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_missing_columns_writes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let csv = "student_code,name\nA001,Juan Pérez\n";

        let result = import_students_csv(&db, csv.as_bytes()).await;

        match result {
            Err(Error::MissingColumns { missing }) => {
                assert_eq!(missing, vec!["first_name", "last_name"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
        assert_eq!(student::count_students(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_bad_rows_do_not_stop_the_batch() -> Result<()> {
        let db = setup_test_db().await?;
        let csv = "last_name,student_code,first_name,extra,grade_level\n\
                   Castro,A001,Ana,,5\n\
                   Diaz,,Bruno,,5\n\
                   Brown,A003\n\
                   Evans,A004,Cleo,repeating year,6\n";

        let report = import_students_csv(&db, csv.as_bytes()).await?;

        let statuses: Vec<&RowStatus> = report.outcomes.iter().map(|o| &o.status).collect();
        assert!(matches!(statuses[0], RowStatus::Inserted { .. }));
        assert!(matches!(statuses[1], RowStatus::Failed { .. }));
        assert!(matches!(statuses[2], RowStatus::Failed { .. }));
        assert!(matches!(statuses[3], RowStatus::Inserted { .. }));
        assert_eq!(report.outcomes[3].row, 4);

        let evans = student::get_student_by_code(&db, "A004").await?.unwrap();
        assert_eq!(evans.extra.as_deref(), Some("repeating year"));
        let castro = student::get_student_by_code(&db, "A001").await?.unwrap();
        assert_eq!(castro.extra, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_template_is_importable() -> Result<()> {
        let db = setup_test_db().await?;
        let template = student_import_template()?;

        let report = import_students_csv(&db, template.as_slice()).await?;

        assert_eq!(report.inserted(), 2);
        assert!(report.message().starts_with("Students imported"));
        Ok(())
    }

    #[test]
    fn test_table_parsing() {
        assert_eq!("students".parse::<Table>().ok(), Some(Table::Students));
        assert_eq!("Student".parse::<Table>().ok(), Some(Table::Students));
        assert_eq!("AttendanceRecord".parse::<Table>().ok(), Some(Table::Attendance));
        assert_eq!("grades".parse::<Table>().ok(), Some(Table::Grades));
        assert_eq!("GradeEntry".parse::<Table>().ok(), Some(Table::Grades));
        assert_eq!(" EXAMS ".parse::<Table>().ok(), Some(Table::Exams));
        assert_eq!("classes".parse::<Table>().ok(), Some(Table::Classes));
        assert!(matches!(
            "parents".parse::<Table>(),
            Err(Error::UnknownTable { .. })
        ));
    }

    #[tokio::test]
    async fn test_teacher_export_after_duplicate_add() -> Result<()> {
        let db = setup_test_db().await?;
        teacher::create_teacher(&db, "A. Lopez", Some("a@x.edu".to_string())).await?;
        let second = teacher::create_teacher(&db, "A. Lopez", None).await;
        assert!(matches!(second, Err(Error::DuplicateKey { .. })));

        let exported = export_table(&db, Table::Teachers).await?;
        let (headers, rows) = parse_export(&exported);

        assert_eq!(headers, vec!["id", "name", "email"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "A. Lopez");
        assert_eq!(rows[0][2], "a@x.edu");
        Ok(())
    }

    #[tokio::test]
    async fn test_export_formats_optional_and_typed_columns() -> Result<()> {
        let (db, class, student) = setup_with_class_and_student().await?;
        let date = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        record_attendance(&db, class.id, student.id, date, true, None).await?;

        let (headers, rows) = parse_export(&export_table(&db, Table::Attendance).await?);
        assert_eq!(headers, Table::Attendance.columns());
        assert_eq!(rows[0][3], "2024-09-02");
        assert_eq!(rows[0][4], "1");
        assert_eq!(rows[0][5], "");

        let (_, class_rows) = parse_export(&export_table(&db, Table::Classes).await?);
        assert_eq!(class_rows[0][1], "");
        assert_eq!(class_rows[0][3], class.class_name);
        Ok(())
    }

    #[tokio::test]
    async fn test_grade_export_keeps_decimal_point() -> Result<()> {
        let (db, class, student) = setup_with_class_and_student().await?;
        record_grade(&db, class.id, student.id, 80.0, None, None).await?;
        record_grade(&db, class.id, student.id, 92.5, Some(0.5), Some("Quiz".to_string())).await?;

        let (_, rows) = parse_export(&export_table(&db, Table::Grades).await?);

        assert_eq!(rows[0][4], "80.0");
        assert_eq!(rows[0][5], "1.0");
        assert_eq!(rows[1][4], "92.5");
        assert_eq!(rows[1][5], "0.5");
        assert_eq!(rows[1][6], "Quiz");
        Ok(())
    }

    #[tokio::test]
    async fn test_every_table_exports_a_header() -> Result<()> {
        let db = setup_test_db().await?;
        for table in Table::ALL {
            let (headers, rows) = parse_export(&export_table(&db, table).await?);
            assert_eq!(headers, table.columns(), "header of {table}");
            assert!(rows.is_empty());
        }
        Ok(())
    }
}
