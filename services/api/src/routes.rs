//! HTTP routes for the college management service

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{SESSION_COOKIE, authorize_role};
use crate::error::ApiError;
use crate::middleware::auth_middleware;
use crate::models::{
    AttendanceFilter, AttendanceMethod, AttendanceRecord, AttendanceSummary, EventFilter,
    NewAttendanceRecord, NewDepartment, NewEvent, NewNote, NewSubject, NewTimetableEntry, NewUser,
    NoteFilter, PublicUser, SubjectFilter, TimetableFilter, User, UserFilter, UserRole,
};
use crate::password::{hash_password, verify_password};
use crate::state::AppState;
use crate::validation::{
    validate_college_id, validate_email, validate_password, validate_required,
};

/// Request for account creation
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub college_id: String,
    pub role: UserRole,
    pub department: String,
    pub year: Option<String>,
    pub position: Option<String>,
    pub profile_picture: Option<String>,
}

/// Request for login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response carrying the acting or newly authenticated user
#[derive(Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsersQuery {
    pub role: Option<UserRole>,
    pub department: Option<String>,
    pub year: Option<String>,
}

/// Request for creating a department
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRequest {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

/// Request for creating a subject
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRequest {
    pub code: String,
    pub name: String,
    pub department_id: Uuid,
    pub year: String,
    pub description: Option<String>,
    pub faculty_id: Option<Uuid>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubjectsQuery {
    pub department_id: Option<Uuid>,
    pub year: Option<String>,
    pub faculty_id: Option<Uuid>,
}

/// Request for creating a timetable entry
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRequest {
    pub subject_id: Uuid,
    pub faculty_id: Uuid,
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
    pub room: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimetableQuery {
    pub subject_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    pub day_of_week: Option<String>,
}

/// Request for manual attendance marking; the acting faculty user is
/// recorded as the marker.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub subject_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub present: bool,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub subject_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

/// Request for issuing a class-session QR code
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeRequest {
    pub subject_id: Uuid,
    pub date: NaiveDate,
}

/// Response for QR code issuance
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    pub qr_code: String,
    pub expires_at: DateTime<Utc>,
}

/// Request for redeeming a QR code. `student_id` defaults to the caller.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub qr_code: String,
    pub student_id: Option<Uuid>,
}

/// Response for a successful scan
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub message: String,
    pub record: AttendanceRecord,
}

/// Request for creating an event
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub department_id: Option<Uuid>,
    pub year: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    pub faculty_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub year: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Request for creating a note
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRequest {
    pub subject_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotesQuery {
    pub subject_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
}

/// Build the full application router.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/departments", post(create_department))
        .route("/api/subjects", post(create_subject))
        .route("/api/timetable", post(create_timetable_entry))
        .route("/api/attendance", post(mark_attendance))
        .route("/api/attendance/qr-code", post(issue_qr_code))
        .route("/api/attendance/scan", post(scan_qr_code))
        .route("/api/events", post(create_event))
        .route("/api/notes", post(create_note))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/users", get(list_users))
        .route("/api/users/:id", get(get_user))
        .route("/api/departments", get(list_departments))
        .route("/api/departments/:id", get(get_department))
        .route("/api/subjects", get(list_subjects))
        .route("/api/subjects/:id", get(get_subject))
        .route("/api/timetable", get(list_timetable))
        .route("/api/attendance", get(list_attendance))
        .route(
            "/api/attendance/summary/student/:id",
            get(attendance_summary),
        )
        .route("/api/events", get(list_events))
        .route("/api/events/:id", get(get_event))
        .route("/api/notes", get(list_notes))
        .merge(protected)
        .with_state(state)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build()
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "college-api"
    }))
}

fn validate_registration(payload: &RegisterRequest) -> Result<(), ApiError> {
    validate_email(&payload.email).map_err(ApiError::Validation)?;
    validate_password(&payload.password).map_err(ApiError::Validation)?;
    validate_college_id(&payload.college_id).map_err(ApiError::Validation)?;
    validate_required("firstName", &payload.first_name).map_err(ApiError::Validation)?;
    validate_required("lastName", &payload.last_name).map_err(ApiError::Validation)?;
    validate_required("department", &payload.department).map_err(ApiError::Validation)?;
    Ok(())
}

/// Account creation; the new user is logged in immediately.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_registration(&payload)?;

    let password = payload.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(|_| ApiError::Internal)?;

    let user = state
        .users
        .create_user(NewUser {
            email: payload.email,
            password_hash,
            first_name: payload.first_name,
            last_name: payload.last_name,
            college_id: payload.college_id,
            role: payload.role,
            department: payload.department,
            year: payload.year,
            position: payload.position,
            profile_picture: payload.profile_picture,
        })
        .await?;

    info!("User registered: {} ({})", user.email, user.role);

    let session = state.sessions.login(&user).await?;
    let jar = jar.add(session_cookie(session.token));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(UserResponse {
            user: user.into_public(),
        }),
    ))
}

/// Login endpoint. Unknown email and wrong password are indistinguishable
/// to the caller.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(user) = state.users.user_by_email(&payload.email).await? else {
        return Err(ApiError::InvalidCredentials);
    };

    let stored = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || verify_password(&payload.password, &stored))
        .await
        .map_err(|_| ApiError::Internal)?;
    if !ok {
        return Err(ApiError::InvalidCredentials);
    }

    info!("Login for user: {}", user.email);

    let session = state.sessions.login(&user).await?;
    let jar = jar.add(session_cookie(session.token));
    Ok((
        jar,
        Json(UserResponse {
            user: user.into_public(),
        }),
    ))
}

/// Logout endpoint; idempotent for callers without a session.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.logout(cookie.value()).await?;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    Ok((jar, Json(serde_json::json!({ "success": true }))))
}

/// The acting user behind the current request.
pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse {
        user: user.into_public(),
    })
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = state
        .users
        .list_users(&UserFilter {
            role: query.role,
            department: query.department,
            year: query.year,
        })
        .await?;
    Ok(Json(users.into_iter().map(User::into_public).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .users
        .user_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user.into_public()))
}

pub async fn create_department(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<DepartmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_role(&user, &[UserRole::Faculty])?;
    validate_required("name", &payload.name).map_err(ApiError::Validation)?;
    validate_required("code", &payload.code).map_err(ApiError::Validation)?;

    let dept = state
        .catalog
        .create_department(NewDepartment {
            name: payload.name,
            code: payload.code,
            description: payload.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(dept)))
}

pub async fn list_departments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog.list_departments().await?))
}

pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let dept = state
        .catalog
        .department_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("department"))?;
    Ok(Json(dept))
}

pub async fn create_subject(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<SubjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_role(&user, &[UserRole::Faculty])?;
    validate_required("name", &payload.name).map_err(ApiError::Validation)?;
    validate_required("code", &payload.code).map_err(ApiError::Validation)?;

    if state
        .catalog
        .department_by_id(payload.department_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("department"));
    }

    let subject = state
        .catalog
        .create_subject(NewSubject {
            code: payload.code,
            name: payload.name,
            department_id: payload.department_id,
            year: payload.year,
            description: payload.description,
            faculty_id: payload.faculty_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn list_subjects(
    State(state): State<AppState>,
    Query(query): Query<SubjectsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let subjects = state
        .catalog
        .list_subjects(&SubjectFilter {
            department_id: query.department_id,
            year: query.year,
            faculty_id: query.faculty_id,
        })
        .await?;
    Ok(Json(subjects))
}

pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let subject = state
        .catalog
        .subject_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("subject"))?;
    Ok(Json(subject))
}

pub async fn create_timetable_entry(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<TimetableRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_role(&user, &[UserRole::Faculty])?;
    validate_required("dayOfWeek", &payload.day_of_week).map_err(ApiError::Validation)?;

    let entry = state
        .catalog
        .create_timetable_entry(NewTimetableEntry {
            subject_id: payload.subject_id,
            faculty_id: payload.faculty_id,
            day_of_week: payload.day_of_week,
            start_time: payload.start_time,
            end_time: payload.end_time,
            room: payload.room,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_timetable(
    State(state): State<AppState>,
    Query(query): Query<TimetableQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .catalog
        .list_timetable_entries(&TimetableFilter {
            subject_id: query.subject_id,
            faculty_id: query.faculty_id,
            day_of_week: query.day_of_week,
        })
        .await?;
    Ok(Json(entries))
}

/// Manual attendance marking, faculty only.
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<AttendanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_role(&user, &[UserRole::Faculty])?;

    let record = state
        .attendance
        .mark_manual(NewAttendanceRecord {
            subject_id: payload.subject_id,
            student_id: payload.student_id,
            faculty_id: user.id,
            date: payload.date,
            present: payload.present,
            method: AttendanceMethod::Manual,
            qr_code: None,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_attendance(
    State(state): State<AppState>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    let records = state
        .attendance
        .list(&AttendanceFilter {
            subject_id: query.subject_id,
            student_id: query.student_id,
            faculty_id: query.faculty_id,
            date: query.date,
        })
        .await?;
    Ok(Json(records))
}

pub async fn attendance_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttendanceSummary>>, ApiError> {
    Ok(Json(state.attendance.student_summary(id).await?))
}

/// QR code issuance for one class session, faculty only.
pub async fn issue_qr_code(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<QrCodeRequest>,
) -> Result<Json<QrCodeResponse>, ApiError> {
    authorize_role(&user, &[UserRole::Faculty])?;

    let issued = state
        .attendance
        .issue_code(user.id, payload.subject_id, payload.date)
        .await?;
    Ok(Json(QrCodeResponse {
        qr_code: issued.code,
        expires_at: issued.expires_at,
    }))
}

/// QR code redemption, student only.
pub async fn scan_qr_code(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, ApiError> {
    authorize_role(&user, &[UserRole::Student])?;

    let student_id = payload.student_id.unwrap_or(user.id);
    let record = state.attendance.redeem(&payload.qr_code, student_id).await?;
    Ok(Json(ScanResponse {
        success: true,
        message: "Attendance marked successfully".to_string(),
        record,
    }))
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<EventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_role(&user, &[UserRole::Faculty])?;
    validate_required("title", &payload.title).map_err(ApiError::Validation)?;

    let event = state
        .catalog
        .create_event(NewEvent {
            title: payload.title,
            description: payload.description,
            location: payload.location,
            start_date: payload.start_date,
            end_date: payload.end_date,
            faculty_id: Some(user.id),
            department_id: payload.department_id,
            year: payload.year,
            event_type: payload.event_type,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let events = state
        .catalog
        .list_events(&EventFilter {
            faculty_id: query.faculty_id,
            department_id: query.department_id,
            year: query.year,
            start_date: query.start_date,
            end_date: query.end_date,
        })
        .await?;
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state
        .catalog
        .event_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("event"))?;
    Ok(Json(event))
}

pub async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<NoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_role(&user, &[UserRole::Faculty])?;
    validate_required("title", &payload.title).map_err(ApiError::Validation)?;

    if state
        .catalog
        .subject_by_id(payload.subject_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("subject"));
    }

    let note = state
        .catalog
        .create_note(NewNote {
            subject_id: payload.subject_id,
            faculty_id: user.id,
            title: payload.title,
            content: payload.content,
            file_url: payload.file_url,
            upload_date: Utc::now(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<NotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = state
        .catalog
        .list_notes(&NoteFilter {
            subject_id: query.subject_id,
            faculty_id: query.faculty_id,
        })
        .await?;
    Ok(Json(notes))
}
