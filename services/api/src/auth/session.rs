//! Session management over a [`SessionStore`].
//!
//! A session is an opaque random token mapped server-side to a user id with
//! an inactivity bound. Two logins by the same user yield two independent
//! sessions.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{Session, User};
use crate::storage::{SessionStore, StorageError, UserStore};

/// Manages login sessions: creation, resolution and teardown.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(sessions: Arc<dyn SessionStore>, users: Arc<dyn UserStore>, ttl_days: i64) -> Self {
        SessionManager {
            sessions,
            users,
            ttl: Duration::days(ttl_days),
        }
    }

    /// Create a new session for a user and return it. Expired sessions are
    /// swept on every login so abandoned ones do not accumulate.
    pub async fn login(&self, user: &User) -> Result<Session, StorageError> {
        self.sessions.delete_expired_sessions().await?;

        let now = Utc::now();
        let session = Session {
            token: new_token(),
            user_id: user.id,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions.create_session(session.clone()).await?;

        info!("Session created for user {}", user.id);
        Ok(session)
    }

    /// Resolve the user behind a session token. Returns `None` for unknown
    /// or expired tokens; expired sessions are deleted on sight.
    pub async fn current_user(&self, token: &str) -> Result<Option<User>, StorageError> {
        let Some(session) = self.sessions.session_by_token(token).await? else {
            return Ok(None);
        };

        if Utc::now() > session.expires_at {
            debug!("Session for user {} expired, removing", session.user_id);
            self.sessions.delete_session(token).await?;
            return Ok(None);
        }

        self.users.user_by_id(session.user_id).await
    }

    /// Invalidate a session token.
    pub async fn logout(&self, token: &str) -> Result<(), StorageError> {
        self.sessions.delete_session(token).await
    }
}

/// 32 random bytes, hex-encoded.
fn new_token() -> String {
    format!(
        "{:032x}{:032x}",
        rand::random::<u128>(),
        rand::random::<u128>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, UserRole};
    use crate::storage::MemStorage;

    async fn manager_with_user(ttl_days: i64) -> (SessionManager, User) {
        let store = Arc::new(MemStorage::new());
        let user = store
            .create_user(NewUser {
                email: "emma@college.edu".to_string(),
                password_hash: "x".to_string(),
                first_name: "Emma".to_string(),
                last_name: "Wilson".to_string(),
                college_id: "STU001".to_string(),
                role: UserRole::Student,
                department: "CSE".to_string(),
                year: Some("3".to_string()),
                position: None,
                profile_picture: None,
            })
            .await
            .unwrap();

        let manager = SessionManager::new(store.clone(), store, ttl_days);
        (manager, user)
    }

    #[tokio::test]
    async fn login_then_current_user_round_trips() {
        let (manager, user) = manager_with_user(30).await;
        let session = manager.login(&user).await.unwrap();

        let resolved = manager.current_user(&session.token).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn two_logins_yield_independent_sessions() {
        let (manager, user) = manager_with_user(30).await;
        let first = manager.login(&user).await.unwrap();
        let second = manager.login(&user).await.unwrap();
        assert_ne!(first.token, second.token);

        manager.logout(&first.token).await.unwrap();
        assert!(manager.current_user(&first.token).await.unwrap().is_none());
        assert!(manager.current_user(&second.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn expired_session_resolves_to_absent() {
        // Negative TTL puts expiry in the past immediately.
        let (manager, user) = manager_with_user(-1).await;
        let session = manager.login(&user).await.unwrap();

        assert!(manager.current_user(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_sweeps_expired_sessions_from_the_store() {
        let store = Arc::new(MemStorage::new());
        let user = store
            .create_user(NewUser {
                email: "emma@college.edu".to_string(),
                password_hash: "x".to_string(),
                first_name: "Emma".to_string(),
                last_name: "Wilson".to_string(),
                college_id: "STU001".to_string(),
                role: UserRole::Student,
                department: "CSE".to_string(),
                year: None,
                position: None,
                profile_picture: None,
            })
            .await
            .unwrap();

        // Negative TTL makes every session expired on arrival.
        let manager = SessionManager::new(store.clone(), store.clone(), -1);
        let abandoned = manager.login(&user).await.unwrap();
        assert!(store.session_by_token(&abandoned.token).await.unwrap().is_some());

        // The next login removes it without the token ever being presented.
        manager.login(&user).await.unwrap();
        assert!(store.session_by_token(&abandoned.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_token_resolves_to_absent() {
        let (manager, _) = manager_with_user(30).await;
        assert!(manager.current_user("no-such-token").await.unwrap().is_none());
    }
}
