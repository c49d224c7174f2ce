//! User and session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role of a user. Closed enumeration: the service knows students and
/// faculty, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Faculty,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Faculty => "faculty",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(UserRole::Student),
            "faculty" => Ok(UserRole::Faculty),
            other => Err(format!("unknown user role: {other}")),
        }
    }
}

/// User entity. The `password_hash` field never leaves the service; every
/// outward path goes through [`User::into_public`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub college_id: String,
    pub role: UserRole,
    pub department: String,
    pub year: Option<String>,
    pub position: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Strip the password credential for responses.
    pub fn into_public(self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            college_id: self.college_id,
            role: self.role,
            department: self.department,
            year: self.year,
            position: self.position,
            profile_picture: self.profile_picture,
        }
    }
}

/// User representation safe to serialize to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub college_id: String,
    pub role: UserRole,
    pub department: String,
    pub year: Option<String>,
    pub position: Option<String>,
    pub profile_picture: Option<String>,
}

/// New user creation payload. `password_hash` is already derived; raw
/// passwords stop at the handler boundary.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub college_id: String,
    pub role: UserRole,
    pub department: String,
    pub year: Option<String>,
    pub position: Option<String>,
    pub profile_picture: Option<String>,
}

/// ANDed filters for user listing; `None` fields impose no constraint.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub department: Option<String>,
    pub year: Option<String>,
}

/// Server-side session record binding an opaque token to a user.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("student".parse::<UserRole>().unwrap(), UserRole::Student);
        assert_eq!("faculty".parse::<UserRole>().unwrap(), UserRole::Faculty);
        assert!("admin".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Faculty.as_str(), "faculty");
    }

    #[test]
    fn public_user_has_no_password_material() {
        let json = serde_json::to_value(
            User {
                id: Uuid::new_v4(),
                email: "emma@college.edu".to_string(),
                password_hash: "secret-hash".to_string(),
                first_name: "Emma".to_string(),
                last_name: "Wilson".to_string(),
                college_id: "STU001".to_string(),
                role: UserRole::Student,
                department: "CSE".to_string(),
                year: Some("3".to_string()),
                position: None,
                profile_picture: None,
                created_at: Utc::now(),
            }
            .into_public(),
        )
        .unwrap();

        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["collegeId"], "STU001");
    }
}
