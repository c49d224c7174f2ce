//! Service configuration from environment variables.

use anyhow::Result;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// PostgreSQL URL; when absent the service runs on the in-memory
    /// backend seeded with development fixtures
    pub database_url: Option<String>,
    /// Lifetime of an issued attendance QR code, in minutes
    pub code_ttl_minutes: i64,
    /// Lifetime of a login session, in days
    pub session_ttl_days: i64,
    /// Whether the development fallback identity resolver is active
    pub dev_auth_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_url: None,
            code_ttl_minutes: 30,
            session_ttl_days: 30,
            dev_auth_enabled: false,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDR`: listen address (default: "0.0.0.0:3000")
    /// - `DATABASE_URL`: PostgreSQL URL (optional; in-memory backend when unset)
    /// - `QR_CODE_TTL_MINUTES`: attendance code lifetime (default: 30)
    /// - `SESSION_TTL_DAYS`: session lifetime (default: 30)
    /// - `DEV_AUTH_ENABLED`: enable the dev fallback resolver (default: false)
    pub fn from_env() -> Result<Self> {
        let mut config = AppConfig::default();

        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        config.database_url = std::env::var("DATABASE_URL").ok();

        if let Ok(minutes) = std::env::var("QR_CODE_TTL_MINUTES") {
            config.code_ttl_minutes = minutes
                .parse()
                .map_err(|_| anyhow::anyhow!("QR_CODE_TTL_MINUTES must be an integer"))?;
        }
        if let Ok(days) = std::env::var("SESSION_TTL_DAYS") {
            config.session_ttl_days = days
                .parse()
                .map_err(|_| anyhow::anyhow!("SESSION_TTL_DAYS must be an integer"))?;
        }
        config.dev_auth_enabled = std::env::var("DEV_AUTH_ENABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(config)
    }
}
