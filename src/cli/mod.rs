//! Command-line host for the school desk.
//!
//! The host owns the store handle for one invocation: it loads settings, opens the
//! store, runs a single command and closes the connection. Every command renders
//! its result to a `String` so the binary only has to print it.

/// Plain-text rendering helpers
pub mod format;

use crate::{
    config::{database, settings::Settings},
    core::{
        attendance::{self, AttendanceMark},
        class,
        exam::{self, ExamFilter},
        grade, overview, student, subject, teacher,
        transfer::{self, Table},
    },
    errors::{Error, Result},
    storage::FsBlobStore,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use format::{format_average, format_percent, id_or_dash, or_dash, render_table};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;

/// School records from the command line
#[derive(Debug, Parser)]
#[command(name = "school-desk", version)]
pub struct Cli {
    /// Path to the settings file
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show how many rows each table holds
    Overview,
    /// Manage students
    #[command(subcommand)]
    Students(StudentCommand),
    /// Manage teachers
    #[command(subcommand)]
    Teachers(TeacherCommand),
    /// Manage subjects
    #[command(subcommand)]
    Subjects(SubjectCommand),
    /// Manage classes
    #[command(subcommand)]
    Classes(ClassCommand),
    /// Record and summarise attendance
    #[command(subcommand)]
    Attendance(AttendanceCommand),
    /// Record grades and compute averages
    #[command(subcommand)]
    Grades(GradeCommand),
    /// Upload, list, download and delete exam files
    #[command(subcommand)]
    Exams(ExamCommand),
    /// Import students from a CSV file (duplicates are skipped)
    Import {
        /// CSV with columns `student_code,first_name,last_name`
        path: PathBuf,
    },
    /// Print the student import template
    Template,
    /// Export one table as CSV
    Export {
        /// Table or entity name, e.g. `students` or `Teacher`
        table: String,
        /// Write to this file instead of standard output
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete every row from every table
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Student commands
#[derive(Debug, Subcommand)]
pub enum StudentCommand {
    /// List students by last name
    List,
    /// Add a student
    Add {
        /// Unique student code, e.g. A001
        code: String,
        /// Given name
        first_name: String,
        /// Family name
        last_name: String,
        /// Free-text notes
        #[arg(long)]
        extra: Option<String>,
    },
    /// Replace a student's details
    Update {
        /// Student id
        id: i64,
        /// Unique student code
        code: String,
        /// Given name
        first_name: String,
        /// Family name
        last_name: String,
        /// Free-text notes
        #[arg(long)]
        extra: Option<String>,
    },
    /// Delete a student
    Delete {
        /// Student id
        id: i64,
    },
}

/// Teacher commands
#[derive(Debug, Subcommand)]
pub enum TeacherCommand {
    /// List teachers
    List,
    /// Add a teacher
    Add {
        /// Full name (unique)
        name: String,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
    },
    /// Rename a teacher or change their email
    Update {
        /// Teacher id
        id: i64,
        /// Full name (unique)
        name: String,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a teacher
    Delete {
        /// Teacher id
        id: i64,
    },
}

/// Subject commands
#[derive(Debug, Subcommand)]
pub enum SubjectCommand {
    /// List subjects
    List,
    /// Add a subject
    Add {
        /// Subject name (unique)
        name: String,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },
    /// Rename a subject or change its description
    Update {
        /// Subject id
        id: i64,
        /// Subject name (unique)
        name: String,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a subject (classes keep their reference)
    Delete {
        /// Subject id
        id: i64,
    },
}

/// Class commands
#[derive(Debug, Subcommand)]
pub enum ClassCommand {
    /// List classes with their subject and teacher
    List,
    /// Add a class
    Add {
        /// Class name, e.g. "3rd Year - A"
        name: String,
        /// Subject id
        #[arg(long)]
        subject_id: Option<i64>,
        /// Teacher id
        #[arg(long)]
        teacher_id: Option<i64>,
        /// Timetable text
        #[arg(long)]
        schedule: Option<String>,
    },
    /// Replace a class's details
    Update {
        /// Class id
        id: i64,
        /// Class name
        name: String,
        /// Subject id
        #[arg(long)]
        subject_id: Option<i64>,
        /// Teacher id
        #[arg(long)]
        teacher_id: Option<i64>,
        /// Timetable text
        #[arg(long)]
        schedule: Option<String>,
    },
    /// Delete a class (its attendance and grades are kept)
    Delete {
        /// Class id
        id: i64,
    },
}

/// Attendance commands
#[derive(Debug, Subcommand)]
pub enum AttendanceCommand {
    /// Save a register for one day
    Mark {
        /// Class id
        class_id: i64,
        /// Day, as YYYY-MM-DD
        date: NaiveDate,
        /// Students present (comma separated ids)
        #[arg(long, value_delimiter = ',')]
        present: Vec<i64>,
        /// Students absent (comma separated ids)
        #[arg(long, value_delimiter = ',')]
        absent: Vec<i64>,
    },
    /// Save one student's attendance with an optional note
    Record {
        /// Class id
        class_id: i64,
        /// Student id
        student_id: i64,
        /// Day, as YYYY-MM-DD
        date: NaiveDate,
        /// Mark the student absent instead of present
        #[arg(long)]
        absent: bool,
        /// Remark such as "late"
        #[arg(long)]
        note: Option<String>,
    },
    /// List attendance records of a class
    List {
        /// Class id
        class_id: i64,
        /// Only this day
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Presence totals per student
    Summary {
        /// Class id
        class_id: i64,
    },
}

/// Grade commands
#[derive(Debug, Subcommand)]
pub enum GradeCommand {
    /// Record a grade
    Add {
        /// Class id
        class_id: i64,
        /// Student id
        student_id: i64,
        /// The mark (0-100)
        grade: f64,
        /// Coefficient (defaults to 1)
        #[arg(long)]
        weight: Option<f64>,
        /// Label such as "Midterm 1"
        #[arg(long)]
        description: Option<String>,
    },
    /// List the grades of a class, newest first
    List {
        /// Class id
        class_id: i64,
    },
    /// Weighted average per student
    Averages {
        /// Class id
        class_id: i64,
    },
}

/// Exam commands
#[derive(Debug, Subcommand)]
pub enum ExamCommand {
    /// Upload an exam file
    Upload {
        /// File to upload
        path: PathBuf,
        /// Uploader name
        #[arg(long, default_value = "")]
        by: String,
        /// Subject id
        #[arg(long)]
        subject_id: Option<i64>,
        /// Class id
        #[arg(long)]
        class_id: Option<i64>,
    },
    /// List uploaded exams, newest first
    List {
        /// Only this subject
        #[arg(long)]
        subject_id: Option<i64>,
        /// Only this class
        #[arg(long)]
        class_id: Option<i64>,
    },
    /// Save an exam file to disk
    Download {
        /// Exam id
        id: i64,
        /// Destination path
        out: PathBuf,
    },
    /// Delete an exam and its file
    Delete {
        /// Exam id
        id: i64,
    },
}

/// Loads settings, opens the store, runs `cli.command`, and closes the store.
pub async fn run(cli: Cli) -> Result<String> {
    let settings = crate::config::settings::load_settings_or_default(&cli.config)?;
    let db = database::open_store(&settings.database_url).await?;
    let output = execute(&db, &settings, cli.command).await;
    db.close().await?;
    output
}

/// Runs one command against an open store.
pub async fn execute(
    db: &DatabaseConnection,
    settings: &Settings,
    command: Command,
) -> Result<String> {
    match command {
        Command::Overview => overview_report(db).await,
        Command::Students(cmd) => students(db, cmd).await,
        Command::Teachers(cmd) => teachers(db, cmd).await,
        Command::Subjects(cmd) => subjects(db, cmd).await,
        Command::Classes(cmd) => classes(db, cmd).await,
        Command::Attendance(cmd) => attendance_cmd(db, cmd).await,
        Command::Grades(cmd) => grades(db, cmd).await,
        Command::Exams(cmd) => exams(db, settings, cmd).await,
        Command::Import { path } => {
            let file = std::fs::File::open(&path)?;
            let report = transfer::import_students_csv(db, file).await?;
            let mut out = format!("{}\n", report.message());
            for outcome in &report.outcomes {
                if let transfer::RowStatus::Failed { reason } = &outcome.status {
                    out.push_str(&format!("row {}: {reason}\n", outcome.row));
                }
            }
            Ok(out)
        }
        Command::Template => Ok(String::from_utf8_lossy(&transfer::student_import_template()?)
            .into_owned()),
        Command::Export { table, out } => {
            let table: Table = table.parse()?;
            let bytes = transfer::export_table(db, table).await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    Ok(format!("Exported {table} to {}\n", path.display()))
                }
                None => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            }
        }
        Command::Reset { yes } => {
            if !yes {
                return Err(Error::InvalidInput {
                    message: "reset deletes all data; pass --yes to confirm".to_string(),
                });
            }
            let removed = database::clear_all_data(db).await?;
            Ok(format!("Deleted {removed} rows\n"))
        }
    }
}

async fn overview_report(db: &DatabaseConnection) -> Result<String> {
    let counts = overview::overview(db).await?;
    let rows = vec![
        vec!["students".to_string(), counts.students.to_string()],
        vec!["teachers".to_string(), counts.teachers.to_string()],
        vec!["subjects".to_string(), counts.subjects.to_string()],
        vec!["classes".to_string(), counts.classes.to_string()],
        vec!["attendance".to_string(), counts.attendance_records.to_string()],
        vec!["grades".to_string(), counts.grade_entries.to_string()],
        vec!["exams".to_string(), counts.exams.to_string()],
    ];
    Ok(render_table(&["table", "rows"], &rows, ""))
}

async fn students(db: &DatabaseConnection, cmd: StudentCommand) -> Result<String> {
    match cmd {
        StudentCommand::List => {
            let rows: Vec<Vec<String>> = student::list_students(db)
                .await?
                .into_iter()
                .map(|s| {
                    vec![
                        s.id.to_string(),
                        s.student_code,
                        s.last_name,
                        s.first_name,
                        or_dash(s.extra.as_deref()).to_string(),
                    ]
                })
                .collect();
            Ok(render_table(
                &["id", "code", "last_name", "first_name", "extra"],
                &rows,
                "No students yet. Add some or import a CSV.",
            ))
        }
        StudentCommand::Add {
            code,
            first_name,
            last_name,
            extra,
        } => {
            let s = student::create_student(db, &code, &first_name, &last_name, extra).await?;
            Ok(format!("Added student {} ({})\n", s.display_name(), s.id))
        }
        StudentCommand::Update {
            id,
            code,
            first_name,
            last_name,
            extra,
        } => {
            let s =
                student::update_student(db, id, &code, &first_name, &last_name, extra).await?;
            Ok(format!("Updated student {}\n", s.display_name()))
        }
        StudentCommand::Delete { id } => {
            student::delete_student(db, id).await?;
            Ok(format!("Deleted student {id}\n"))
        }
    }
}

async fn teachers(db: &DatabaseConnection, cmd: TeacherCommand) -> Result<String> {
    match cmd {
        TeacherCommand::List => {
            let rows: Vec<Vec<String>> = teacher::list_teachers(db)
                .await?
                .into_iter()
                .map(|t| {
                    vec![
                        t.id.to_string(),
                        t.name,
                        or_dash(t.email.as_deref()).to_string(),
                    ]
                })
                .collect();
            Ok(render_table(&["id", "name", "email"], &rows, "No teachers yet."))
        }
        TeacherCommand::Add { name, email } => {
            let t = teacher::create_teacher(db, &name, email).await?;
            Ok(format!("Added teacher {} ({})\n", t.name, t.id))
        }
        TeacherCommand::Update { id, name, email } => {
            let t = teacher::update_teacher(db, id, &name, email).await?;
            Ok(format!("Updated teacher {}\n", t.name))
        }
        TeacherCommand::Delete { id } => {
            teacher::delete_teacher(db, id).await?;
            Ok(format!("Deleted teacher {id}\n"))
        }
    }
}

async fn subjects(db: &DatabaseConnection, cmd: SubjectCommand) -> Result<String> {
    match cmd {
        SubjectCommand::List => {
            let rows: Vec<Vec<String>> = subject::list_subjects(db)
                .await?
                .into_iter()
                .map(|s| {
                    vec![
                        s.id.to_string(),
                        s.name,
                        or_dash(s.description.as_deref()).to_string(),
                    ]
                })
                .collect();
            Ok(render_table(&["id", "name", "description"], &rows, "No subjects yet."))
        }
        SubjectCommand::Add { name, description } => {
            let s = subject::create_subject(db, &name, description).await?;
            Ok(format!("Added subject {} ({})\n", s.name, s.id))
        }
        SubjectCommand::Update {
            id,
            name,
            description,
        } => {
            let s = subject::update_subject(db, id, &name, description).await?;
            Ok(format!("Updated subject {}\n", s.name))
        }
        SubjectCommand::Delete { id } => {
            subject::delete_subject(db, id).await?;
            Ok(format!("Deleted subject {id}\n"))
        }
    }
}

async fn classes(db: &DatabaseConnection, cmd: ClassCommand) -> Result<String> {
    match cmd {
        ClassCommand::List => {
            let rows: Vec<Vec<String>> = class::list_classes_with_names(db)
                .await?
                .into_iter()
                .map(|l| {
                    vec![
                        l.class.id.to_string(),
                        l.class.class_name,
                        or_dash(l.subject_name.as_deref()).to_string(),
                        or_dash(l.teacher_name.as_deref()).to_string(),
                        or_dash(l.class.schedule.as_deref()).to_string(),
                    ]
                })
                .collect();
            Ok(render_table(
                &["id", "class", "subject", "teacher", "schedule"],
                &rows,
                "No classes yet.",
            ))
        }
        ClassCommand::Add {
            name,
            subject_id,
            teacher_id,
            schedule,
        } => {
            let c = class::create_class(db, &name, subject_id, teacher_id, schedule).await?;
            Ok(format!("Added class {} ({})\n", c.class_name, c.id))
        }
        ClassCommand::Update {
            id,
            name,
            subject_id,
            teacher_id,
            schedule,
        } => {
            let c = class::update_class(db, id, &name, subject_id, teacher_id, schedule).await?;
            Ok(format!("Updated class {}\n", c.class_name))
        }
        ClassCommand::Delete { id } => {
            class::delete_class(db, id).await?;
            Ok(format!("Deleted class {id}\n"))
        }
    }
}

async fn attendance_cmd(db: &DatabaseConnection, cmd: AttendanceCommand) -> Result<String> {
    match cmd {
        AttendanceCommand::Mark {
            class_id,
            date,
            present,
            absent,
        } => {
            let marks: Vec<AttendanceMark> = present
                .into_iter()
                .map(|id| (id, true))
                .chain(absent.into_iter().map(|id| (id, false)))
                .map(|(student_id, present)| AttendanceMark {
                    student_id,
                    present,
                    note: None,
                })
                .collect();
            let saved = attendance::save_attendance_sheet(db, class_id, date, &marks).await?;
            Ok(format!("Saved attendance for {} students on {date}\n", saved.len()))
        }
        AttendanceCommand::Record {
            class_id,
            student_id,
            date,
            absent,
            note,
        } => {
            let record =
                attendance::record_attendance(db, class_id, student_id, date, !absent, note)
                    .await?;
            let state = if record.present { "present" } else { "absent" };
            Ok(format!("Student {student_id} marked {state} on {date}\n"))
        }
        AttendanceCommand::List { class_id, date } => {
            let records = match date {
                Some(date) => attendance::list_attendance_for_date(db, class_id, date).await?,
                None => attendance::list_attendance_for_class(db, class_id).await?,
            };
            let rows: Vec<Vec<String>> = records
                .into_iter()
                .map(|r| {
                    vec![
                        r.date.to_string(),
                        r.student_id.to_string(),
                        if r.present { "yes" } else { "no" }.to_string(),
                        or_dash(r.note.as_deref()).to_string(),
                    ]
                })
                .collect();
            Ok(render_table(
                &["date", "student_id", "present", "note"],
                &rows,
                "No attendance recorded for this class yet.",
            ))
        }
        AttendanceCommand::Summary { class_id } => {
            let rows: Vec<Vec<String>> = attendance::attendance_summary(db, class_id)
                .await?
                .into_iter()
                .map(|s| {
                    vec![
                        s.student_id.to_string(),
                        s.display_name(),
                        s.presents.to_string(),
                        s.total.to_string(),
                        format_percent(s.percent),
                    ]
                })
                .collect();
            Ok(render_table(
                &["student_id", "student", "presents", "total", "percent"],
                &rows,
                "No attendance recorded for this class yet.",
            ))
        }
    }
}

async fn grades(db: &DatabaseConnection, cmd: GradeCommand) -> Result<String> {
    match cmd {
        GradeCommand::Add {
            class_id,
            student_id,
            grade: mark,
            weight,
            description,
        } => {
            let entry =
                grade::record_grade(db, class_id, student_id, mark, weight, description).await?;
            Ok(format!(
                "Recorded grade {} (weight {}) for student {student_id}\n",
                entry.grade, entry.weight
            ))
        }
        GradeCommand::List { class_id } => {
            let rows: Vec<Vec<String>> = grade::list_grades_for_class(db, class_id)
                .await?
                .into_iter()
                .map(|l| {
                    vec![
                        l.entry.id.to_string(),
                        l.student_name,
                        l.entry.grade.to_string(),
                        l.entry.weight.to_string(),
                        l.entry.date.format("%Y-%m-%d %H:%M").to_string(),
                        or_dash(l.entry.description.as_deref()).to_string(),
                    ]
                })
                .collect();
            Ok(render_table(
                &["id", "student", "grade", "weight", "date", "description"],
                &rows,
                "No grades recorded for this class yet.",
            ))
        }
        GradeCommand::Averages { class_id } => {
            let rows: Vec<Vec<String>> = grade::grade_averages(db, class_id)
                .await?
                .into_iter()
                .map(|a| {
                    vec![
                        a.student_id.to_string(),
                        a.display_name(),
                        a.entries.to_string(),
                        format_average(a.average),
                    ]
                })
                .collect();
            Ok(render_table(
                &["student_id", "student", "entries", "average"],
                &rows,
                "No grades recorded for this class yet.",
            ))
        }
    }
}

async fn exams(db: &DatabaseConnection, settings: &Settings, cmd: ExamCommand) -> Result<String> {
    let blobs = FsBlobStore::open(&settings.exams_dir)?;
    match cmd {
        ExamCommand::Upload {
            path,
            by,
            subject_id,
            class_id,
        } => {
            let bytes = std::fs::read(&path)?;
            let original_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let record =
                exam::upload_exam(db, &blobs, &bytes, &original_name, &by, subject_id, class_id)
                    .await?;
            Ok(format!(
                "Uploaded {} as {} ({})\n",
                record.original_name, record.file_name, record.id
            ))
        }
        ExamCommand::List {
            subject_id,
            class_id,
        } => {
            let filter = ExamFilter {
                subject_id,
                class_id,
            };
            let rows: Vec<Vec<String>> = exam::list_exams(db, filter)
                .await?
                .into_iter()
                .map(|l| {
                    vec![
                        l.exam.id.to_string(),
                        l.exam.original_name,
                        l.exam.file_name,
                        or_dash(Some(l.exam.uploaded_by.as_str())).to_string(),
                        l.exam.upload_date.format("%Y-%m-%d %H:%M").to_string(),
                        or_dash(l.subject_name.as_deref()).to_string(),
                        or_dash(l.class_name.as_deref()).to_string(),
                        id_or_dash(l.exam.class_id),
                    ]
                })
                .collect();
            Ok(render_table(
                &[
                    "id", "original_name", "file_name", "uploaded_by", "uploaded", "subject",
                    "class", "class_id",
                ],
                &rows,
                "No exams uploaded yet.",
            ))
        }
        ExamCommand::Download { id, out } => {
            let (record, bytes) = exam::fetch_exam_artifact(db, &blobs, id).await?;
            std::fs::write(&out, bytes)?;
            Ok(format!("Saved {} to {}\n", record.original_name, out.display()))
        }
        ExamCommand::Delete { id } => {
            exam::delete_exam(db, &blobs, id).await?;
            Ok(format!("Deleted exam {id}\n"))
        }
    }
}
