//! Multi-strategy identity resolution.
//!
//! Protected requests are authenticated by an ordered chain of
//! [`IdentityResolver`] strategies; the first one that yields a user wins
//! and the rest are never consulted. The order is fixed: session cookie,
//! bearer token, query parameter, custom headers, development fallback.
//!
//! Strategies 2-4 trust a caller-supplied user id without verifying any
//! credential. That matches the contract this service inherited and is
//! NOT suitable for production as-is; see DESIGN.md. The development
//! fallback is compiled in but inert unless `DEV_AUTH_ENABLED` is set.

use async_trait::async_trait;
use axum::http::{Request, header};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{SESSION_COOKIE, SessionManager};
use crate::error::ApiError;
use crate::models::{User, UserFilter, UserRole};
use crate::storage::{StorageError, UserStore};

/// Email of the placeholder account the development fallback resolves to,
/// when one exists.
const DEV_FALLBACK_EMAIL: &str = "dev.faculty@college.edu";

/// Identity material extracted from one inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity {
    /// Session token from the session cookie
    pub session_token: Option<String>,
    /// `Authorization: Bearer` value
    pub bearer_token: Option<String>,
    /// `userId` query parameter
    pub query_user_id: Option<Uuid>,
    /// `x-user-id` header
    pub header_user_id: Option<Uuid>,
    /// `id` field of the JSON profile in the `x-current-user` header
    pub header_current_user: Option<Uuid>,
}

impl RequestIdentity {
    /// Pull every piece of identity material out of a request without
    /// consuming it.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let headers = req.headers();
        let jar = CookieJar::from_headers(headers);

        let session_token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

        let bearer_token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);

        let query_user_id = req.uri().query().and_then(user_id_from_query);

        let header_user_id = headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());

        let header_current_user = headers
            .get("x-current-user")
            .and_then(|v| v.to_str().ok())
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(raw).ok())
            .and_then(|profile| {
                profile
                    .get("id")
                    .and_then(|id| id.as_str())
                    .and_then(|id| Uuid::parse_str(id).ok())
            });

        RequestIdentity {
            session_token,
            bearer_token,
            query_user_id,
            header_user_id,
            header_current_user,
        }
    }
}

fn user_id_from_query(query: &str) -> Option<Uuid> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "userId" {
            Uuid::parse_str(value).ok()
        } else {
            None
        }
    })
}

/// One strategy for deriving an acting user from a request.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Strategy name, used for tracing.
    fn name(&self) -> &'static str;

    /// Attempt to resolve a user; `None` means "no claim here, try the
    /// next strategy".
    async fn resolve(&self, identity: &RequestIdentity) -> Result<Option<User>, StorageError>;
}

/// Strategy 1: server-side session referenced by the session cookie.
pub struct SessionResolver {
    sessions: SessionManager,
}

impl SessionResolver {
    pub fn new(sessions: SessionManager) -> Self {
        SessionResolver { sessions }
    }
}

#[async_trait]
impl IdentityResolver for SessionResolver {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn resolve(&self, identity: &RequestIdentity) -> Result<Option<User>, StorageError> {
        match &identity.session_token {
            Some(token) => self.sessions.current_user(token).await,
            None => Ok(None),
        }
    }
}

/// Strategy 2: bearer token carrying a user id, looked up as-is.
pub struct BearerTokenResolver {
    users: Arc<dyn UserStore>,
}

impl BearerTokenResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        BearerTokenResolver { users }
    }
}

#[async_trait]
impl IdentityResolver for BearerTokenResolver {
    fn name(&self) -> &'static str {
        "bearer-token"
    }

    async fn resolve(&self, identity: &RequestIdentity) -> Result<Option<User>, StorageError> {
        let Some(id) = identity
            .bearer_token
            .as_deref()
            .and_then(|t| Uuid::parse_str(t).ok())
        else {
            return Ok(None);
        };
        self.users.user_by_id(id).await
    }
}

/// Strategy 3: `userId` query parameter.
pub struct QueryParamResolver {
    users: Arc<dyn UserStore>,
}

impl QueryParamResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        QueryParamResolver { users }
    }
}

#[async_trait]
impl IdentityResolver for QueryParamResolver {
    fn name(&self) -> &'static str {
        "query-param"
    }

    async fn resolve(&self, identity: &RequestIdentity) -> Result<Option<User>, StorageError> {
        match identity.query_user_id {
            Some(id) => self.users.user_by_id(id).await,
            None => Ok(None),
        }
    }
}

/// Strategy 4: `x-user-id` or `x-current-user` headers.
pub struct HeaderResolver {
    users: Arc<dyn UserStore>,
}

impl HeaderResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        HeaderResolver { users }
    }
}

#[async_trait]
impl IdentityResolver for HeaderResolver {
    fn name(&self) -> &'static str {
        "header"
    }

    async fn resolve(&self, identity: &RequestIdentity) -> Result<Option<User>, StorageError> {
        let Some(id) = identity.header_user_id.or(identity.header_current_user) else {
            return Ok(None);
        };
        self.users.user_by_id(id).await
    }
}

/// Strategy 5: development fallback resolving to a well-known faculty
/// account. Only wired into the chain when the dev flag is set.
pub struct DevFallbackResolver {
    users: Arc<dyn UserStore>,
}

impl DevFallbackResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        DevFallbackResolver { users }
    }
}

#[async_trait]
impl IdentityResolver for DevFallbackResolver {
    fn name(&self) -> &'static str {
        "dev-fallback"
    }

    async fn resolve(&self, _identity: &RequestIdentity) -> Result<Option<User>, StorageError> {
        if let Some(user) = self.users.user_by_email(DEV_FALLBACK_EMAIL).await? {
            return Ok(Some(user));
        }

        // No dedicated placeholder account; fall back to any faculty user.
        let faculty = self
            .users
            .list_users(&UserFilter {
                role: Some(UserRole::Faculty),
                ..Default::default()
            })
            .await?;
        Ok(faculty.into_iter().next())
    }
}

/// The ordered, short-circuiting resolution pipeline.
pub struct ResolverChain {
    resolvers: Vec<Box<dyn IdentityResolver>>,
}

impl ResolverChain {
    /// Build the standard chain. The dev fallback is appended only when
    /// `dev_fallback` is set.
    pub fn new(sessions: SessionManager, users: Arc<dyn UserStore>, dev_fallback: bool) -> Self {
        let mut resolvers: Vec<Box<dyn IdentityResolver>> = vec![
            Box::new(SessionResolver::new(sessions)),
            Box::new(BearerTokenResolver::new(users.clone())),
            Box::new(QueryParamResolver::new(users.clone())),
            Box::new(HeaderResolver::new(users.clone())),
        ];
        if dev_fallback {
            warn!("Development fallback authentication is ENABLED");
            resolvers.push(Box::new(DevFallbackResolver::new(users)));
        }
        ResolverChain { resolvers }
    }

    /// Run the chain; the first strategy yielding a user wins.
    pub async fn resolve(&self, identity: &RequestIdentity) -> Result<Option<User>, StorageError> {
        for resolver in &self.resolvers {
            if let Some(user) = resolver.resolve(identity).await? {
                debug!("Identity resolved via {} strategy", resolver.name());
                return Ok(Some(user));
            }
        }
        Ok(None)
    }
}

/// Role gate for protected operations.
pub fn authorize_role(user: &User, allowed: &[UserRole]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::storage::MemStorage;

    fn new_user(email: &str, college_id: &str, role: UserRole) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "x".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            college_id: college_id.to_string(),
            role,
            department: "CSE".to_string(),
            year: None,
            position: None,
            profile_picture: None,
        }
    }

    /// Chain over a fresh in-memory store with one student (who has a live
    /// session) and one faculty user. Returns the student's session token.
    async fn chain_with_users(dev_fallback: bool) -> (ResolverChain, User, User, String) {
        let store = Arc::new(MemStorage::new());
        let student = store
            .create_user(new_user("emma@college.edu", "STU001", UserRole::Student))
            .await
            .unwrap();
        let faculty = store
            .create_user(new_user("johnson@college.edu", "FAC001", UserRole::Faculty))
            .await
            .unwrap();

        let sessions = SessionManager::new(store.clone(), store.clone(), 30);
        let session = sessions.login(&student).await.unwrap();
        let chain = ResolverChain::new(sessions, store, dev_fallback);
        (chain, student, faculty, session.token)
    }

    #[tokio::test]
    async fn session_wins_over_bearer_token() {
        let (chain, student, faculty, token) = chain_with_users(false).await;

        let identity = RequestIdentity {
            session_token: Some(token),
            bearer_token: Some(faculty.id.to_string()),
            ..Default::default()
        };

        let resolved = chain.resolve(&identity).await.unwrap().unwrap();
        assert_eq!(resolved.id, student.id);
    }

    #[tokio::test]
    async fn bearer_token_alone_resolves_its_user() {
        let (chain, _, faculty, _) = chain_with_users(false).await;

        let identity = RequestIdentity {
            bearer_token: Some(faculty.id.to_string()),
            ..Default::default()
        };

        let resolved = chain.resolve(&identity).await.unwrap().unwrap();
        assert_eq!(resolved.id, faculty.id);
    }

    #[tokio::test]
    async fn header_claim_resolves_when_earlier_strategies_are_silent() {
        let (chain, student, _, _) = chain_with_users(false).await;

        let identity = RequestIdentity {
            header_user_id: Some(student.id),
            ..Default::default()
        };

        let resolved = chain.resolve(&identity).await.unwrap().unwrap();
        assert_eq!(resolved.id, student.id);
    }

    #[tokio::test]
    async fn no_material_resolves_to_nobody() {
        let (chain, _, _, _) = chain_with_users(false).await;
        let resolved = chain.resolve(&RequestIdentity::default()).await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn dev_fallback_only_fires_when_enabled() {
        let (chain, _, faculty, _) = chain_with_users(true).await;
        let resolved = chain.resolve(&RequestIdentity::default()).await.unwrap();
        assert_eq!(resolved.unwrap().id, faculty.id);

        let (chain, _, _, _) = chain_with_users(false).await;
        assert!(chain.resolve(&RequestIdentity::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_bearer_id_falls_through() {
        let (chain, _, _, _) = chain_with_users(false).await;
        let identity = RequestIdentity {
            bearer_token: Some(Uuid::new_v4().to_string()),
            ..Default::default()
        };
        assert!(chain.resolve(&identity).await.unwrap().is_none());
    }

    #[test]
    fn role_gate_admits_and_rejects() {
        let user = User {
            id: Uuid::new_v4(),
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
            created_at: chrono::Utc::now(),
        };

        assert!(authorize_role(&user, &[UserRole::Student]).is_ok());
        assert!(matches!(
            authorize_role(&user, &[UserRole::Faculty]),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn query_string_user_id_extraction() {
        let id = Uuid::new_v4();
        assert_eq!(user_id_from_query(&format!("userId={id}")), Some(id));
        assert_eq!(user_id_from_query(&format!("a=b&userId={id}&c=d")), Some(id));
        assert_eq!(user_id_from_query("userId=not-a-uuid"), None);
        assert_eq!(user_id_from_query("other=param"), None);
    }
}
