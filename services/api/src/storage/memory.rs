//! In-memory storage backend.
//!
//! Used in development (when no `DATABASE_URL` is configured) and in tests.
//! All tables live behind one `RwLock`; taking the write lock serialises
//! the uniqueness check and the insert, which is what makes concurrent
//! registration and concurrent QR redemption safe on this backend.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    AttendanceFilter, AttendanceRecord, Department, Event, EventFilter, NewAttendanceRecord,
    NewDepartment, NewEvent, NewNote, NewSubject, NewTimetableEntry, NewUser, Note, NoteFilter,
    Session, Subject, SubjectFilter, TimetableEntry, TimetableFilter, User, UserFilter, UserRole,
};
use crate::password;
use crate::storage::{AttendanceStore, CatalogStore, SessionStore, StorageError, UserStore};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<String, Session>,
    attendance: HashMap<Uuid, AttendanceRecord>,
    departments: HashMap<Uuid, Department>,
    subjects: HashMap<Uuid, Subject>,
    timetable: HashMap<Uuid, TimetableEntry>,
    events: HashMap<Uuid, Event>,
    notes: HashMap<Uuid, Note>,
}

/// In-memory implementation of every storage trait.
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl MemStorage {
    pub fn new() -> Self {
        MemStorage {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// A store pre-seeded with the development fixtures: two departments,
    /// two faculty members, one student and two subjects. All seeded
    /// accounts use the password `password123`.
    pub fn with_sample_data() -> anyhow::Result<Self> {
        let mut tables = Tables::default();
        let password_hash = password::hash_password("password123")?;

        let cse = Department {
            id: Uuid::new_v4(),
            name: "Computer Science & Engineering".to_string(),
            code: "CSE".to_string(),
            description: Some("Computer Science & Engineering Department".to_string()),
        };
        let ece = Department {
            id: Uuid::new_v4(),
            name: "Electronics & Communication Engineering".to_string(),
            code: "ECE".to_string(),
            description: Some("Electronics & Communication Engineering Department".to_string()),
        };

        let johnson = User {
            id: Uuid::new_v4(),
            email: "johnson@college.edu".to_string(),
            password_hash: password_hash.clone(),
            first_name: "Michael".to_string(),
            last_name: "Johnson".to_string(),
            college_id: "FAC001".to_string(),
            role: UserRole::Faculty,
            department: "CSE".to_string(),
            year: None,
            position: Some("Professor".to_string()),
            profile_picture: None,
            created_at: Utc::now(),
        };
        let williams = User {
            id: Uuid::new_v4(),
            email: "williams@college.edu".to_string(),
            password_hash: password_hash.clone(),
            first_name: "Sarah".to_string(),
            last_name: "Williams".to_string(),
            college_id: "FAC002".to_string(),
            role: UserRole::Faculty,
            department: "CSE".to_string(),
            year: None,
            position: Some("Associate Professor".to_string()),
            profile_picture: None,
            created_at: Utc::now(),
        };
        let emma = User {
            id: Uuid::new_v4(),
            email: "emma@college.edu".to_string(),
            password_hash,
            first_name: "Emma".to_string(),
            last_name: "Wilson".to_string(),
            college_id: "STU001".to_string(),
            role: UserRole::Student,
            department: "CSE".to_string(),
            year: Some("3".to_string()),
            position: None,
            profile_picture: None,
            created_at: Utc::now(),
        };

        let architecture = Subject {
            id: Uuid::new_v4(),
            code: "CSE-301".to_string(),
            name: "Computer Architecture".to_string(),
            department_id: cse.id,
            year: "3".to_string(),
            description: Some("Study of computer organization and architecture".to_string()),
            faculty_id: Some(johnson.id),
        };
        let marketing = Subject {
            id: Uuid::new_v4(),
            code: "MKT-201".to_string(),
            name: "Digital Marketing".to_string(),
            department_id: cse.id,
            year: "3".to_string(),
            description: Some("Introduction to digital marketing concepts".to_string()),
            faculty_id: Some(williams.id),
        };

        let monday_morning = TimetableEntry {
            id: Uuid::new_v4(),
            subject_id: architecture.id,
            faculty_id: johnson.id,
            day_of_week: "Monday".to_string(),
            start_time: "9:00 AM".to_string(),
            end_time: "10:30 AM".to_string(),
            room: Some("Room 305".to_string()),
        };

        for dept in [cse, ece] {
            tables.departments.insert(dept.id, dept);
        }
        for user in [johnson, williams, emma] {
            tables.users.insert(user.id, user);
        }
        for subject in [architecture, marketing] {
            tables.subjects.insert(subject.id, subject);
        }
        tables.timetable.insert(monday_morning.id, monday_morning);

        Ok(MemStorage {
            tables: RwLock::new(tables),
        })
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemStorage {
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        // The write lock spans the uniqueness check and the insert.
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StorageError::DuplicateEmail);
        }
        if tables.users.values().any(|u| u.college_id == user.college_id) {
            return Err(StorageError::DuplicateCollegeId);
        }

        let stored = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            college_id: user.college_id,
            role: user.role,
            department: user.department,
            year: user.year,
            position: user.position,
            profile_picture: user.profile_picture,
            created_at: Utc::now(),
        };
        tables.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_college_id(&self, college_id: &str) -> Result<Option<User>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.college_id == college_id)
            .cloned())
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| filter.role.is_none_or(|role| u.role == role))
            .filter(|u| {
                filter
                    .department
                    .as_deref()
                    .is_none_or(|dept| u.department == dept)
            })
            .filter(|u| filter.year.as_deref().is_none_or(|y| u.year.as_deref() == Some(y)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SessionStore for MemStorage {
    async fn create_session(&self, session: Session) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        tables.sessions.insert(session.token.clone(), session);
        Ok(())
    }

    async fn session_by_token(&self, token: &str) -> Result<Option<Session>, StorageError> {
        Ok(self.tables.read().await.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StorageError> {
        self.tables.write().await.sessions.remove(token);
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<(), StorageError> {
        let now = Utc::now();
        self.tables.write().await.sessions.retain(|_, s| s.expires_at > now);
        Ok(())
    }
}

#[async_trait]
impl AttendanceStore for MemStorage {
    async fn create_record(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, StorageError> {
        let mut tables = self.tables.write().await;

        let duplicate = tables.attendance.values().any(|r| {
            r.subject_id == record.subject_id
                && r.student_id == record.student_id
                && r.date == record.date
        });
        if duplicate {
            return Err(StorageError::DuplicateAttendance);
        }

        let stored = AttendanceRecord {
            id: Uuid::new_v4(),
            subject_id: record.subject_id,
            student_id: record.student_id,
            faculty_id: record.faculty_id,
            date: record.date,
            present: record.present,
            method: record.method,
            qr_code: record.qr_code,
            created_at: Utc::now(),
        };
        tables.attendance.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_records(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .attendance
            .values()
            .filter(|r| filter.subject_id.is_none_or(|id| r.subject_id == id))
            .filter(|r| filter.student_id.is_none_or(|id| r.student_id == id))
            .filter(|r| filter.faculty_id.is_none_or(|id| r.faculty_id == id))
            .filter(|r| filter.date.is_none_or(|date| r.date == date))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for MemStorage {
    async fn create_department(&self, dept: NewDepartment) -> Result<Department, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.departments.values().any(|d| d.name == dept.name) {
            return Err(StorageError::DuplicateDepartmentName);
        }
        if tables.departments.values().any(|d| d.code == dept.code) {
            return Err(StorageError::DuplicateDepartmentCode);
        }
        let stored = Department {
            id: Uuid::new_v4(),
            name: dept.name,
            code: dept.code,
            description: dept.description,
        };
        tables.departments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn department_by_id(&self, id: Uuid) -> Result<Option<Department>, StorageError> {
        Ok(self.tables.read().await.departments.get(&id).cloned())
    }

    async fn list_departments(&self) -> Result<Vec<Department>, StorageError> {
        Ok(self.tables.read().await.departments.values().cloned().collect())
    }

    async fn create_subject(&self, subject: NewSubject) -> Result<Subject, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.subjects.values().any(|s| s.code == subject.code) {
            return Err(StorageError::DuplicateSubjectCode);
        }
        let stored = Subject {
            id: Uuid::new_v4(),
            code: subject.code,
            name: subject.name,
            department_id: subject.department_id,
            year: subject.year,
            description: subject.description,
            faculty_id: subject.faculty_id,
        };
        tables.subjects.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn subject_by_id(&self, id: Uuid) -> Result<Option<Subject>, StorageError> {
        Ok(self.tables.read().await.subjects.get(&id).cloned())
    }

    async fn list_subjects(&self, filter: &SubjectFilter) -> Result<Vec<Subject>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .subjects
            .values()
            .filter(|s| filter.department_id.is_none_or(|id| s.department_id == id))
            .filter(|s| filter.year.as_deref().is_none_or(|y| s.year == y))
            .filter(|s| filter.faculty_id.is_none_or(|id| s.faculty_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn create_timetable_entry(
        &self,
        entry: NewTimetableEntry,
    ) -> Result<TimetableEntry, StorageError> {
        let mut tables = self.tables.write().await;
        let stored = TimetableEntry {
            id: Uuid::new_v4(),
            subject_id: entry.subject_id,
            faculty_id: entry.faculty_id,
            day_of_week: entry.day_of_week,
            start_time: entry.start_time,
            end_time: entry.end_time,
            room: entry.room,
        };
        tables.timetable.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_timetable_entries(
        &self,
        filter: &TimetableFilter,
    ) -> Result<Vec<TimetableEntry>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .timetable
            .values()
            .filter(|e| filter.subject_id.is_none_or(|id| e.subject_id == id))
            .filter(|e| filter.faculty_id.is_none_or(|id| e.faculty_id == id))
            .filter(|e| {
                filter
                    .day_of_week
                    .as_deref()
                    .is_none_or(|day| e.day_of_week == day)
            })
            .cloned()
            .collect())
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event, StorageError> {
        let mut tables = self.tables.write().await;
        let stored = Event {
            id: Uuid::new_v4(),
            title: event.title,
            description: event.description,
            location: event.location,
            start_date: event.start_date,
            end_date: event.end_date,
            faculty_id: event.faculty_id,
            department_id: event.department_id,
            year: event.year,
            event_type: event.event_type,
        };
        tables.events.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, StorageError> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .values()
            .filter(|e| filter.faculty_id.is_none_or(|id| e.faculty_id == Some(id)))
            .filter(|e| {
                filter
                    .department_id
                    .is_none_or(|id| e.department_id == Some(id))
            })
            .filter(|e| {
                filter
                    .year
                    .as_deref()
                    .is_none_or(|y| e.year.as_deref() == Some(y))
            })
            .filter(|e| filter.start_date.is_none_or(|from| e.start_date >= from))
            .filter(|e| filter.end_date.is_none_or(|until| e.start_date <= until))
            .cloned()
            .collect())
    }

    async fn create_note(&self, note: NewNote) -> Result<Note, StorageError> {
        let mut tables = self.tables.write().await;
        let stored = Note {
            id: Uuid::new_v4(),
            subject_id: note.subject_id,
            faculty_id: note.faculty_id,
            title: note.title,
            content: note.content,
            file_url: note.file_url,
            upload_date: note.upload_date,
        };
        tables.notes.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_notes(&self, filter: &NoteFilter) -> Result<Vec<Note>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .values()
            .filter(|n| filter.subject_id.is_none_or(|id| n.subject_id == id))
            .filter(|n| filter.faculty_id.is_none_or(|id| n.faculty_id == id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceMethod;
    use chrono::NaiveDate;

    fn new_user(email: &str, college_id: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "x".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            college_id: college_id.to_string(),
            role: UserRole::Student,
            department: "CSE".to_string(),
            year: Some("3".to_string()),
            position: None,
            profile_picture: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_and_store_keeps_one_user() {
        let store = MemStorage::new();
        store.create_user(new_user("a@college.edu", "STU001")).await.unwrap();

        let err = store
            .create_user(new_user("a@college.edu", "STU002"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateEmail));

        let all = store.list_users(&UserFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_college_id_is_rejected() {
        let store = MemStorage::new();
        store.create_user(new_user("a@college.edu", "STU001")).await.unwrap();

        let err = store
            .create_user(new_user("b@college.edu", "STU001"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateCollegeId));
    }

    #[tokio::test]
    async fn user_by_college_id_finds_the_stored_user() {
        let store = MemStorage::new();
        let created = store.create_user(new_user("a@college.edu", "STU001")).await.unwrap();

        let found = store.user_by_college_id("STU001").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.email, "a@college.edu");

        assert!(store.user_by_college_id("STU999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_department_name_and_code_are_rejected() {
        let store = MemStorage::new();
        store
            .create_department(NewDepartment {
                name: "Computer Science".to_string(),
                code: "CSE".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let err = store
            .create_department(NewDepartment {
                name: "Computer Science".to_string(),
                code: "CS".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateDepartmentName));

        let err = store
            .create_department(NewDepartment {
                name: "Computing".to_string(),
                code: "CSE".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateDepartmentCode));

        let all = store.list_departments().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_subject_code_is_rejected() {
        let store = MemStorage::new();
        let dept = store
            .create_department(NewDepartment {
                name: "Computer Science".to_string(),
                code: "CSE".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let subject = NewSubject {
            code: "CSE-301".to_string(),
            name: "Data Structures".to_string(),
            department_id: dept.id,
            year: "3".to_string(),
            description: None,
            faculty_id: None,
        };
        store.create_subject(subject.clone()).await.unwrap();

        let err = store
            .create_subject(NewSubject {
                name: "Algorithms".to_string(),
                ..subject
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateSubjectCode));

        let all = store.list_subjects(&SubjectFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn user_filters_are_anded() {
        let store = MemStorage::new();
        store.create_user(new_user("a@college.edu", "STU001")).await.unwrap();
        let mut faculty = new_user("b@college.edu", "FAC001");
        faculty.role = UserRole::Faculty;
        faculty.year = None;
        store.create_user(faculty).await.unwrap();

        let students = store
            .list_users(&UserFilter {
                role: Some(UserRole::Student),
                department: Some("CSE".to_string()),
                year: Some("3".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].email, "a@college.edu");

        let mismatched = store
            .list_users(&UserFilter {
                role: Some(UserRole::Student),
                department: Some("ECE".to_string()),
                year: None,
            })
            .await
            .unwrap();
        assert!(mismatched.is_empty());
    }

    #[tokio::test]
    async fn second_attendance_record_for_same_key_is_rejected() {
        let store = MemStorage::new();
        let record = NewAttendanceRecord {
            subject_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            faculty_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            present: true,
            method: AttendanceMethod::Manual,
            qr_code: None,
        };
        store.create_record(record.clone()).await.unwrap();

        let err = store.create_record(record).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateAttendance));
    }

    #[tokio::test]
    async fn sample_data_contains_the_seeded_accounts() {
        let store = MemStorage::with_sample_data().unwrap();
        let faculty = store
            .list_users(&UserFilter {
                role: Some(UserRole::Faculty),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(faculty.len(), 2);

        let emma = store.user_by_email("emma@college.edu").await.unwrap().unwrap();
        assert!(password::verify_password("password123", &emma.password_hash));
    }
}
