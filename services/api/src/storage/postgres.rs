//! PostgreSQL storage backend.
//!
//! Uniqueness is delegated to the unique constraints declared in the
//! migrations; violation errors are recognised by constraint name and
//! surfaced as the typed duplicate variants, so a pair of concurrent
//! inserts can never both succeed.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    AttendanceFilter, AttendanceRecord, Department, Event, EventFilter, NewAttendanceRecord,
    NewDepartment, NewEvent, NewNote, NewSubject, NewTimetableEntry, NewUser, Note, NoteFilter,
    Session, Subject, SubjectFilter, TimetableEntry, TimetableFilter, User, UserFilter,
};
use crate::storage::{AttendanceStore, CatalogStore, SessionStore, StorageError, UserStore};

/// PostgreSQL implementation of every storage trait.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        PgStorage { pool }
    }
}

/// Map a unique-constraint violation to its typed duplicate error;
/// everything else stays a database error.
fn map_unique(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("users_email_key") => return StorageError::DuplicateEmail,
                Some("users_college_id_key") => return StorageError::DuplicateCollegeId,
                Some("attendance_records_subject_student_date_key") => {
                    return StorageError::DuplicateAttendance;
                }
                Some("departments_name_key") => return StorageError::DuplicateDepartmentName,
                Some("departments_code_key") => return StorageError::DuplicateDepartmentCode,
                Some("subjects_code_key") => return StorageError::DuplicateSubjectCode,
                _ => {}
            }
        }
    }
    StorageError::Database(err)
}

fn user_from_row(row: &PgRow) -> Result<User, StorageError> {
    let role: String = row.get("role");
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        college_id: row.get("college_id"),
        role: role.parse().map_err(StorageError::Invalid)?,
        department: row.get("department"),
        year: row.get("year"),
        position: row.get("position"),
        profile_picture: row.get("profile_picture"),
        created_at: row.get("created_at"),
    })
}

fn record_from_row(row: &PgRow) -> Result<AttendanceRecord, StorageError> {
    let method: String = row.get("method");
    Ok(AttendanceRecord {
        id: row.get("id"),
        subject_id: row.get("subject_id"),
        student_id: row.get("student_id"),
        faculty_id: row.get("faculty_id"),
        date: row.get("date"),
        present: row.get("present"),
        method: method.parse().map_err(StorageError::Invalid)?,
        qr_code: row.get("qr_code"),
        created_at: row.get("created_at"),
    })
}

fn department_from_row(row: &PgRow) -> Department {
    Department {
        id: row.get("id"),
        name: row.get("name"),
        code: row.get("code"),
        description: row.get("description"),
    }
}

fn subject_from_row(row: &PgRow) -> Subject {
    Subject {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        department_id: row.get("department_id"),
        year: row.get("year"),
        description: row.get("description"),
        faculty_id: row.get("faculty_id"),
    }
}

fn timetable_entry_from_row(row: &PgRow) -> TimetableEntry {
    TimetableEntry {
        id: row.get("id"),
        subject_id: row.get("subject_id"),
        faculty_id: row.get("faculty_id"),
        day_of_week: row.get("day_of_week"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        room: row.get("room"),
    }
}

fn event_from_row(row: &PgRow) -> Event {
    Event {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        location: row.get("location"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        faculty_id: row.get("faculty_id"),
        department_id: row.get("department_id"),
        year: row.get("year"),
        event_type: row.get("event_type"),
    }
}

fn note_from_row(row: &PgRow) -> Note {
    Note {
        id: row.get("id"),
        subject_id: row.get("subject_id"),
        faculty_id: row.get("faculty_id"),
        title: row.get("title"),
        content: row.get("content"),
        file_url: row.get("file_url"),
        upload_date: row.get("upload_date"),
    }
}

#[async_trait]
impl UserStore for PgStorage {
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        info!("Creating user: {}", user.email);

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name,
                               college_id, role, department, year, position, profile_picture)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, email, password_hash, first_name, last_name, college_id,
                      role, department, year, position, profile_picture, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.college_id)
        .bind(user.role.as_str())
        .bind(&user.department)
        .bind(&user.year)
        .bind(&user.position)
        .bind(&user.profile_picture)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique)?;

        user_from_row(&row)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_college_id(&self, college_id: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query("SELECT * FROM users WHERE college_id = $1")
            .bind(college_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::text IS NULL OR department = $2)
              AND ($3::text IS NULL OR year = $3)
            ORDER BY last_name, first_name
            "#,
        )
        .bind(filter.role.map(|r| r.as_str()))
        .bind(&filter.department)
        .bind(&filter.year)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }
}

#[async_trait]
impl SessionStore for PgStorage {
    async fn create_session(&self, session: Session) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn session_by_token(&self, token: &str) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Session {
            token: row.get("token"),
            user_id: row.get("user_id"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
        }))
    }

    async fn delete_session(&self, token: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AttendanceStore for PgStorage {
    async fn create_record(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, StorageError> {
        info!(
            "Recording attendance: subject {} student {} on {}",
            record.subject_id, record.student_id, record.date
        );

        let row = sqlx::query(
            r#"
            INSERT INTO attendance_records
                (id, subject_id, student_id, faculty_id, date, present, method, qr_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, subject_id, student_id, faculty_id, date, present,
                      method, qr_code, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.subject_id)
        .bind(record.student_id)
        .bind(record.faculty_id)
        .bind(record.date)
        .bind(record.present)
        .bind(record.method.as_str())
        .bind(&record.qr_code)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique)?;

        record_from_row(&row)
    }

    async fn list_records(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM attendance_records
            WHERE ($1::uuid IS NULL OR subject_id = $1)
              AND ($2::uuid IS NULL OR student_id = $2)
              AND ($3::uuid IS NULL OR faculty_id = $3)
              AND ($4::date IS NULL OR date = $4)
            ORDER BY date DESC
            "#,
        )
        .bind(filter.subject_id)
        .bind(filter.student_id)
        .bind(filter.faculty_id)
        .bind(filter.date)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }
}

#[async_trait]
impl CatalogStore for PgStorage {
    async fn create_department(&self, dept: NewDepartment) -> Result<Department, StorageError> {
        let row = sqlx::query(
            r#"
            INSERT INTO departments (id, name, code, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, code, description
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&dept.name)
        .bind(&dept.code)
        .bind(&dept.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique)?;

        Ok(department_from_row(&row))
    }

    async fn department_by_id(&self, id: Uuid) -> Result<Option<Department>, StorageError> {
        let row = sqlx::query("SELECT * FROM departments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(department_from_row))
    }

    async fn list_departments(&self) -> Result<Vec<Department>, StorageError> {
        let rows = sqlx::query("SELECT * FROM departments ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(department_from_row).collect())
    }

    async fn create_subject(&self, subject: NewSubject) -> Result<Subject, StorageError> {
        let row = sqlx::query(
            r#"
            INSERT INTO subjects (id, code, name, department_id, year, description, faculty_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, code, name, department_id, year, description, faculty_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&subject.code)
        .bind(&subject.name)
        .bind(subject.department_id)
        .bind(&subject.year)
        .bind(&subject.description)
        .bind(subject.faculty_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique)?;

        Ok(subject_from_row(&row))
    }

    async fn subject_by_id(&self, id: Uuid) -> Result<Option<Subject>, StorageError> {
        let row = sqlx::query("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(subject_from_row))
    }

    async fn list_subjects(&self, filter: &SubjectFilter) -> Result<Vec<Subject>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM subjects
            WHERE ($1::uuid IS NULL OR department_id = $1)
              AND ($2::text IS NULL OR year = $2)
              AND ($3::uuid IS NULL OR faculty_id = $3)
            ORDER BY code
            "#,
        )
        .bind(filter.department_id)
        .bind(&filter.year)
        .bind(filter.faculty_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(subject_from_row).collect())
    }

    async fn create_timetable_entry(
        &self,
        entry: NewTimetableEntry,
    ) -> Result<TimetableEntry, StorageError> {
        let row = sqlx::query(
            r#"
            INSERT INTO timetable_entries
                (id, subject_id, faculty_id, day_of_week, start_time, end_time, room)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, subject_id, faculty_id, day_of_week, start_time, end_time, room
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.subject_id)
        .bind(entry.faculty_id)
        .bind(&entry.day_of_week)
        .bind(&entry.start_time)
        .bind(&entry.end_time)
        .bind(&entry.room)
        .fetch_one(&self.pool)
        .await?;

        Ok(timetable_entry_from_row(&row))
    }

    async fn list_timetable_entries(
        &self,
        filter: &TimetableFilter,
    ) -> Result<Vec<TimetableEntry>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM timetable_entries
            WHERE ($1::uuid IS NULL OR subject_id = $1)
              AND ($2::uuid IS NULL OR faculty_id = $2)
              AND ($3::text IS NULL OR day_of_week = $3)
            "#,
        )
        .bind(filter.subject_id)
        .bind(filter.faculty_id)
        .bind(&filter.day_of_week)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(timetable_entry_from_row).collect())
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event, StorageError> {
        let row = sqlx::query(
            r#"
            INSERT INTO events (id, title, description, location, start_date, end_date,
                                faculty_id, department_id, year, event_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, title, description, location, start_date, end_date,
                      faculty_id, department_id, year, event_type
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.faculty_id)
        .bind(event.department_id)
        .bind(&event.year)
        .bind(&event.event_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(event_from_row(&row))
    }

    async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, StorageError> {
        let row = sqlx::query("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(event_from_row))
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM events
            WHERE ($1::uuid IS NULL OR faculty_id = $1)
              AND ($2::uuid IS NULL OR department_id = $2)
              AND ($3::text IS NULL OR year = $3)
              AND ($4::timestamptz IS NULL OR start_date >= $4)
              AND ($5::timestamptz IS NULL OR start_date <= $5)
            ORDER BY start_date
            "#,
        )
        .bind(filter.faculty_id)
        .bind(filter.department_id)
        .bind(&filter.year)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(event_from_row).collect())
    }

    async fn create_note(&self, note: NewNote) -> Result<Note, StorageError> {
        let row = sqlx::query(
            r#"
            INSERT INTO notes (id, subject_id, faculty_id, title, content, file_url, upload_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, subject_id, faculty_id, title, content, file_url, upload_date
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(note.subject_id)
        .bind(note.faculty_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.file_url)
        .bind(note.upload_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(note_from_row(&row))
    }

    async fn list_notes(&self, filter: &NoteFilter) -> Result<Vec<Note>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM notes
            WHERE ($1::uuid IS NULL OR subject_id = $1)
              AND ($2::uuid IS NULL OR faculty_id = $2)
            ORDER BY upload_date DESC
            "#,
        )
        .bind(filter.subject_id)
        .bind(filter.faculty_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(note_from_row).collect())
    }
}
