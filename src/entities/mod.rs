//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables. References between tables are
//! plain (optional) id columns without declared relations, so a dangling id is
//! legal and every reader resolves it by lookup.

pub mod attendance;
pub mod class;
pub mod exam;
pub mod grade;
pub mod student;
pub mod subject;
pub mod teacher;

// Re-export specific types to avoid conflicts
pub use attendance::{
    Column as AttendanceColumn, Entity as Attendance, Model as AttendanceModel,
};
pub use class::{Column as ClassColumn, Entity as Class, Model as ClassModel};
pub use exam::{Column as ExamColumn, Entity as Exam, Model as ExamModel};
pub use grade::{Column as GradeColumn, Entity as Grade, Model as GradeModel};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use subject::{Column as SubjectColumn, Entity as Subject, Model as SubjectModel};
pub use teacher::{Column as TeacherColumn, Entity as Teacher, Model as TeacherModel};
