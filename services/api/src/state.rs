//! Shared application state threaded through every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::attendance::{AttendanceService, CodeIssuer};
use crate::auth::{ResolverChain, SessionManager};
use crate::config::AppConfig;
use crate::storage::{CatalogStore, MemStorage, PgStorage, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionManager,
    pub attendance: AttendanceService,
    pub catalog: Arc<dyn CatalogStore>,
    pub authenticator: Arc<ResolverChain>,
}

impl AppState {
    /// State over the in-memory backend.
    pub fn with_memory(store: Arc<MemStorage>, config: &AppConfig) -> Self {
        Self::build(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            config,
        )
    }

    /// State over the PostgreSQL backend.
    pub fn with_postgres(pool: PgPool, config: &AppConfig) -> Self {
        let store = Arc::new(PgStorage::new(pool));
        Self::build(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            config,
        )
    }

    fn build(
        users: Arc<dyn UserStore>,
        session_store: Arc<dyn crate::storage::SessionStore>,
        records: Arc<dyn crate::storage::AttendanceStore>,
        catalog: Arc<dyn CatalogStore>,
        config: &AppConfig,
    ) -> Self {
        let sessions = SessionManager::new(session_store, users.clone(), config.session_ttl_days);
        let attendance = AttendanceService::new(
            records,
            catalog.clone(),
            CodeIssuer::new(config.code_ttl_minutes),
        );
        let authenticator = Arc::new(ResolverChain::new(
            sessions.clone(),
            users.clone(),
            config.dev_auth_enabled,
        ));

        AppState {
            users,
            sessions,
            attendance,
            catalog,
            authenticator,
        }
    }
}
