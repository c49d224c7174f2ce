//! Domain models for the Campus Connect service

pub mod attendance;
pub mod catalog;
pub mod user;

// Re-export for convenience
pub use attendance::{
    AttendanceFilter, AttendanceMethod, AttendanceRecord, AttendanceSummary, IssuedCode,
    NewAttendanceRecord,
};
pub use catalog::{
    Department, Event, EventFilter, NewDepartment, NewEvent, NewNote, NewSubject,
    NewTimetableEntry, Note, NoteFilter, Subject, SubjectFilter, TimetableEntry, TimetableFilter,
};
pub use user::{NewUser, PublicUser, Session, User, UserFilter, UserRole};
