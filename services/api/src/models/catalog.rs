//! Catalog entities: departments, subjects, timetable, events and notes.
//!
//! These are plain data-entry collaborators of the attendance flow; the
//! subject and department of a class session come from here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Department entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

/// Subject entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub department_id: Uuid,
    pub year: String,
    pub description: Option<String>,
    pub faculty_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewSubject {
    pub code: String,
    pub name: String,
    pub department_id: Uuid,
    pub year: String,
    pub description: Option<String>,
    pub faculty_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectFilter {
    pub department_id: Option<Uuid>,
    pub year: Option<String>,
    pub faculty_id: Option<Uuid>,
}

/// One slot in the weekly timetable
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub faculty_id: Uuid,
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
    pub room: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTimetableEntry {
    pub subject_id: Uuid,
    pub faculty_id: Uuid,
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
    pub room: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TimetableFilter {
    pub subject_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    pub day_of_week: Option<String>,
}

/// College event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub faculty_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub year: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub faculty_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub year: Option<String>,
    pub event_type: Option<String>,
}

/// Both bounds filter on the event start date, matching how clients query
/// "events in this window".
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub faculty_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub year: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Lecture notes / syllabus upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub faculty_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub upload_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub subject_id: Uuid,
    pub faculty_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub upload_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub subject_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
}
