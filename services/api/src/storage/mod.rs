//! Storage abstraction behind the service.
//!
//! Every handler talks to these traits, never to a concrete backend, so the
//! same service runs against PostgreSQL in production and an in-memory
//! store in development and tests. Uniqueness (user email, user college id,
//! department name/code, subject code, one attendance record per
//! subject/student/date) is enforced *inside* the store in one atomic
//! step; callers must not check-then-insert.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AttendanceFilter, AttendanceRecord, Department, Event, EventFilter, NewAttendanceRecord,
    NewDepartment, NewEvent, NewNote, NewSubject, NewTimetableEntry, NewUser, Note, NoteFilter,
    Session, Subject, SubjectFilter, TimetableEntry, TimetableFilter, User, UserFilter,
};

pub mod memory;
pub mod postgres;

pub use memory::MemStorage;
pub use postgres::PgStorage;

/// Errors raised by storage backends. The duplicate variants are typed so
/// the boundary can turn them into user-correctable responses.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("college id already registered")]
    DuplicateCollegeId,

    #[error("attendance already recorded for this subject, student and date")]
    DuplicateAttendance,

    #[error("department name already taken")]
    DuplicateDepartmentName,

    #[error("department code already taken")]
    DuplicateDepartmentCode,

    #[error("subject code already taken")]
    DuplicateSubjectCode,

    #[error("invalid stored value: {0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence of user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user; fails with the corresponding duplicate error if the
    /// email or college id is already taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StorageError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    async fn user_by_college_id(&self, college_id: &str) -> Result<Option<User>, StorageError>;

    /// List users matching all filters; absent filter fields impose no
    /// constraint.
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, StorageError>;
}

/// Persistence of login sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: Session) -> Result<(), StorageError>;

    async fn session_by_token(&self, token: &str) -> Result<Option<Session>, StorageError>;

    async fn delete_session(&self, token: &str) -> Result<(), StorageError>;

    /// Drop every session whose expiry is in the past. Called lazily so
    /// abandoned sessions do not accumulate without bound.
    async fn delete_expired_sessions(&self) -> Result<(), StorageError>;
}

/// Persistence of attendance records.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Create a record. The (subject, student, date) uniqueness check and
    /// the insert happen as one atomic step; a second record for the same
    /// key fails with [`StorageError::DuplicateAttendance`].
    async fn create_record(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, StorageError>;

    async fn list_records(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StorageError>;
}

/// Persistence of the course catalog and campus life entities.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Create a department; fails with the corresponding duplicate error
    /// if the name or code is already taken.
    async fn create_department(&self, dept: NewDepartment) -> Result<Department, StorageError>;
    async fn department_by_id(&self, id: Uuid) -> Result<Option<Department>, StorageError>;
    async fn list_departments(&self) -> Result<Vec<Department>, StorageError>;

    /// Create a subject; fails with `DuplicateSubjectCode` if the code is
    /// already taken.
    async fn create_subject(&self, subject: NewSubject) -> Result<Subject, StorageError>;
    async fn subject_by_id(&self, id: Uuid) -> Result<Option<Subject>, StorageError>;
    async fn list_subjects(&self, filter: &SubjectFilter) -> Result<Vec<Subject>, StorageError>;

    async fn create_timetable_entry(
        &self,
        entry: NewTimetableEntry,
    ) -> Result<TimetableEntry, StorageError>;
    async fn list_timetable_entries(
        &self,
        filter: &TimetableFilter,
    ) -> Result<Vec<TimetableEntry>, StorageError>;

    async fn create_event(&self, event: NewEvent) -> Result<Event, StorageError>;
    async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, StorageError>;
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StorageError>;

    async fn create_note(&self, note: NewNote) -> Result<Note, StorageError>;
    async fn list_notes(&self, filter: &NoteFilter) -> Result<Vec<Note>, StorageError>;
}
