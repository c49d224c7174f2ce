//! Attendance models: durable records and transient QR codes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How an attendance record came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceMethod {
    /// Entered by faculty through the manual marking endpoint
    Manual,
    /// Produced by a student redeeming a QR code
    Scan,
}

impl AttendanceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceMethod::Manual => "manual",
            AttendanceMethod::Scan => "scan",
        }
    }
}

impl fmt::Display for AttendanceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(AttendanceMethod::Manual),
            "scan" => Ok(AttendanceMethod::Scan),
            other => Err(format!("unknown attendance method: {other}")),
        }
    }
}

/// The durable fact that a student was marked present or absent for a
/// subject on a date. At most one record exists per
/// (subject, student, date); the storage layer enforces this atomically.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub student_id: Uuid,
    pub faculty_id: Uuid,
    pub date: NaiveDate,
    pub present: bool,
    pub method: AttendanceMethod,
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for an attendance record.
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub subject_id: Uuid,
    pub student_id: Uuid,
    pub faculty_id: Uuid,
    pub date: NaiveDate,
    pub present: bool,
    pub method: AttendanceMethod,
    pub qr_code: Option<String>,
}

/// ANDed filters for attendance listing.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub subject_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

/// Per-subject attendance percentage for one student.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub percentage: u32,
}

/// A short-lived QR code bound to one (faculty, subject, date) class
/// session. The code itself is not single-use: any number of distinct
/// students may redeem it before expiry.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: String,
    pub faculty_id: Uuid,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
