//! Attendance: QR code issuance, redemption and manual marking.
//!
//! Codes live only in process memory; restarting the service voids every
//! outstanding code, which is acceptable at a 30 minute lifetime. Records
//! are durable and unique per (subject, student, date) at the storage
//! layer, so two racing redemptions of the same code by the same student
//! produce exactly one record.

use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    AttendanceFilter, AttendanceMethod, AttendanceRecord, AttendanceSummary, IssuedCode,
    NewAttendanceRecord,
};
use crate::storage::{AttendanceStore, CatalogStore, StorageError};

/// Mints and tracks short-lived QR codes in memory.
#[derive(Clone)]
pub struct CodeIssuer {
    codes: Arc<RwLock<HashMap<String, IssuedCode>>>,
    ttl: Duration,
}

impl CodeIssuer {
    pub fn new(ttl_minutes: i64) -> Self {
        CodeIssuer {
            codes: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Mint a fresh code for a class session. Expired codes are swept on
    /// every issuance so the table stays bounded by active class count.
    pub async fn issue(&self, faculty_id: Uuid, subject_id: Uuid, date: NaiveDate) -> IssuedCode {
        let now = Utc::now();
        let issued = IssuedCode {
            code: new_code(),
            faculty_id,
            subject_id,
            date,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut codes = self.codes.write().await;
        codes.retain(|_, c| c.expires_at > now);
        codes.insert(issued.code.clone(), issued.clone());
        debug!("Issued QR code for subject {subject_id} on {date}");
        issued
    }

    /// Look up a code without consuming it.
    pub async fn lookup(&self, code: &str) -> Option<IssuedCode> {
        self.codes.read().await.get(code).cloned()
    }

    /// Drop a code, typically once it is found expired.
    pub async fn evict(&self, code: &str) {
        self.codes.write().await.remove(code);
    }
}

/// 16 random bytes, hex-encoded.
fn new_code() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Coordinates code issuance and redemption with durable record keeping.
#[derive(Clone)]
pub struct AttendanceService {
    records: Arc<dyn AttendanceStore>,
    catalog: Arc<dyn CatalogStore>,
    codes: CodeIssuer,
}

impl AttendanceService {
    pub fn new(
        records: Arc<dyn AttendanceStore>,
        catalog: Arc<dyn CatalogStore>,
        codes: CodeIssuer,
    ) -> Self {
        AttendanceService {
            records,
            catalog,
            codes,
        }
    }

    /// Issue a QR code for one class session.
    pub async fn issue_code(
        &self,
        faculty_id: Uuid,
        subject_id: Uuid,
        date: NaiveDate,
    ) -> Result<IssuedCode, ApiError> {
        if self.catalog.subject_by_id(subject_id).await?.is_none() {
            return Err(ApiError::NotFound("subject"));
        }
        Ok(self.codes.issue(faculty_id, subject_id, date).await)
    }

    /// Redeem a QR code for a student, producing a present record.
    ///
    /// Validity is checked at redemption time, not issuance time, so a
    /// code scanned moments after expiry is rejected deterministically.
    pub async fn redeem(&self, code: &str, student_id: Uuid) -> Result<AttendanceRecord, ApiError> {
        let Some(issued) = self.codes.lookup(code).await else {
            return Err(ApiError::InvalidCode);
        };

        if Utc::now() > issued.expires_at {
            self.codes.evict(code).await;
            return Err(ApiError::ExpiredCode);
        }

        let record = self
            .records
            .create_record(NewAttendanceRecord {
                subject_id: issued.subject_id,
                student_id,
                faculty_id: issued.faculty_id,
                date: issued.date,
                present: true,
                method: AttendanceMethod::Scan,
                qr_code: Some(issued.code),
            })
            .await?;

        info!(
            "Attendance marked via scan for student {student_id} in subject {}",
            record.subject_id
        );
        Ok(record)
    }

    /// Faculty marking a student present or absent directly.
    pub async fn mark_manual(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, ApiError> {
        if self.catalog.subject_by_id(record.subject_id).await?.is_none() {
            return Err(ApiError::NotFound("subject"));
        }
        let record = self.records.create_record(record).await?;
        info!(
            "Attendance marked manually for student {} in subject {}",
            record.student_id, record.subject_id
        );
        Ok(record)
    }

    pub async fn list(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StorageError> {
        self.records.list_records(filter).await
    }

    /// Per-subject percentages for one student, over every subject that
    /// has at least one record for them.
    pub async fn student_summary(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<AttendanceSummary>, ApiError> {
        let records = self
            .records
            .list_records(&AttendanceFilter {
                student_id: Some(student_id),
                ..Default::default()
            })
            .await?;

        let mut by_subject: HashMap<Uuid, (u32, u32)> = HashMap::new();
        for record in &records {
            let counts = by_subject.entry(record.subject_id).or_default();
            counts.1 += 1;
            if record.present {
                counts.0 += 1;
            }
        }

        let mut summaries = Vec::with_capacity(by_subject.len());
        for (subject_id, (present, total)) in by_subject {
            let subject_name = self
                .catalog
                .subject_by_id(subject_id)
                .await?
                .map(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string());
            summaries.push(AttendanceSummary {
                subject_id,
                subject_name,
                percentage: (present * 100 + total / 2) / total,
            });
        }
        summaries.sort_by(|a, b| a.subject_name.cmp(&b.subject_name));
        Ok(summaries)
    }
}
