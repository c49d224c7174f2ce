//! Error taxonomy for the Campus Connect service.
//!
//! Domain errors travel as typed values through the components and are
//! translated to HTTP status + JSON body only here, at the boundary.
//! Storage failures are logged server-side and surfaced as a generic 500.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::storage::StorageError;

/// Service error taxonomy.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing input; carries field-level detail
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User with this email already exists")]
    DuplicateEmail,

    #[error("This College ID is already in use")]
    DuplicateCollegeId,

    #[error("A department with this name already exists")]
    DuplicateDepartmentName,

    #[error("A department with this code already exists")]
    DuplicateDepartmentCode,

    #[error("A subject with this code already exists")]
    DuplicateSubjectCode,

    /// Wrong email or password, indistinguishable to the caller
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No identity resolution strategy produced a user
    #[error("Not authenticated")]
    Unauthenticated,

    /// Identity resolved but its role does not permit the operation
    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid QR code")]
    InvalidCode,

    #[error("QR code has expired")]
    ExpiredCode,

    #[error("Attendance already marked")]
    AlreadyMarked,

    #[error("Internal server error")]
    Internal,

    #[error("storage error: {0}")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateEmail => ApiError::DuplicateEmail,
            StorageError::DuplicateCollegeId => ApiError::DuplicateCollegeId,
            StorageError::DuplicateAttendance => ApiError::AlreadyMarked,
            StorageError::DuplicateDepartmentName => ApiError::DuplicateDepartmentName,
            StorageError::DuplicateDepartmentCode => ApiError::DuplicateDepartmentCode,
            StorageError::DuplicateSubjectCode => ApiError::DuplicateSubjectCode,
            other => ApiError::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_)
            | ApiError::DuplicateEmail
            | ApiError::DuplicateCollegeId
            | ApiError::DuplicateDepartmentName
            | ApiError::DuplicateDepartmentCode
            | ApiError::DuplicateSubjectCode
            | ApiError::InvalidCode
            | ApiError::ExpiredCode
            | ApiError::AlreadyMarked => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            // Redemption failures keep the scan response shape so clients
            // can show the message directly.
            ApiError::InvalidCode | ApiError::ExpiredCode | ApiError::AlreadyMarked => {
                json!({ "success": false, "message": self.to_string() })
            }
            ApiError::Storage(err) => {
                error!("storage failure: {err}");
                json!({ "error": "Internal server error" })
            }
            ApiError::Internal => json!({ "error": "Internal server error" }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redemption_errors_carry_distinct_messages() {
        assert_eq!(ApiError::InvalidCode.to_string(), "Invalid QR code");
        assert_eq!(ApiError::ExpiredCode.to_string(), "QR code has expired");
        assert_eq!(ApiError::AlreadyMarked.to_string(), "Attendance already marked");
    }

    #[test]
    fn duplicate_storage_errors_become_user_correctable() {
        assert!(matches!(
            ApiError::from(StorageError::DuplicateEmail),
            ApiError::DuplicateEmail
        ));
        assert!(matches!(
            ApiError::from(StorageError::DuplicateCollegeId),
            ApiError::DuplicateCollegeId
        ));
        assert!(matches!(
            ApiError::from(StorageError::DuplicateAttendance),
            ApiError::AlreadyMarked
        ));
        assert!(matches!(
            ApiError::from(StorageError::DuplicateDepartmentName),
            ApiError::DuplicateDepartmentName
        ));
        assert!(matches!(
            ApiError::from(StorageError::DuplicateDepartmentCode),
            ApiError::DuplicateDepartmentCode
        ));
        assert!(matches!(
            ApiError::from(StorageError::DuplicateSubjectCode),
            ApiError::DuplicateSubjectCode
        ));
    }
}
