//! Configuration management.
//!
//! Configuration is loaded from a YAML file (default `config.yaml`) and then overridden by
//! environment variables:
//!
//! - `PORTAL_`-prefixed variables, with `__` separating nested keys
//!   (e.g. `PORTAL_AUTH__SESSION__TIMEOUT=2h`, `PORTAL_ACCESS__DIRECTORY_READ=non_guest`)
//! - `DATABASE_URL`, which replaces `database.url`
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 3000
//! database:
//!   url: sqlite://portal.db?mode=rwc
//! admin_email: admin@example.org
//! admin_password: change-me
//! auth:
//!   session:
//!     timeout: 8h
//!     cookie_secure: false
//! access:
//!   directory_read: authenticated
//!   directory_update_missing: not_found
//! ```

use crate::errors::Error;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const DEV_FRONTEND_ORIGIN: &str = "http://localhost:5173";

/// Command line arguments
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PORTAL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Set from the `DATABASE_URL` environment variable; replaces `database.url` on load
    #[serde(skip_serializing)]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    /// Email of the `admin_global` account ensured at startup
    pub admin_email: String,
    /// Password for that account. When unset the account is only created if missing,
    /// with no usable password.
    pub admin_password: Option<String>,
    /// Export tracing spans over OTLP (configured with the standard OTEL_* variables)
    pub enable_otel_export: bool,
    pub auth: AuthConfig,
    pub access: AccessConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection string, e.g. `sqlite://portal.db?mode=rwc` or `sqlite::memory:`
    pub url: String,
    pub pool: PoolSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds, 0 = never)
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub password: PasswordConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Argon2 memory cost in KiB
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Idle time after which a session is forgotten
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
}

/// `SameSite` attribute of the session cookie
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl SameSite {
    /// Attribute value as written in `Set-Cookie`
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// Either `*` or a specific origin URL
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// Access rules that differ between deployments.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    pub directory_read: DirectoryReadAccess,
    pub directory_update_missing: MissingUpdateBehavior,
}

/// Who may list, search and read the employee directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryReadAccess {
    /// Anyone, with or without a session
    #[default]
    Public,
    /// Any caller with a session
    Authenticated,
    /// Callers with a session whose profile is not the guest profile
    NonGuest,
}

/// Outcome of a directory update whose id matches no employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingUpdateBehavior {
    /// Report success; nothing was changed
    #[default]
    Succeed,
    /// Report 404
    NotFound,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            database: DatabaseConfig::default(),
            admin_email: "admin@example.org".to_string(),
            admin_password: None,
            enable_otel_export: false,
            auth: AuthConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://portal.db?mode=rwc".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 128,
            // Argon2id RFC 9106 low-memory profile
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8 * 60 * 60),
            cookie_name: "portal_session".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Url::parse(DEV_FRONTEND_ORIGIN).map(CorsOrigin::Url).into_iter().collect(),
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

impl PoolSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        (self.max_lifetime_secs > 0).then(|| Duration::from_secs(self.max_lifetime_secs))
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let password = &self.auth.password;
        if password.min_length < 1 {
            return Err(Error::Internal {
                operation: "Config validation: password min_length must be at least 1".to_string(),
            });
        }
        if password.min_length > password.max_length {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: password min_length ({}) cannot be greater than max_length ({})",
                    password.min_length, password.max_length
                ),
            });
        }

        if self.auth.session.timeout < Duration::from_secs(60) {
            return Err(Error::Internal {
                operation: "Config validation: session timeout must be at least 1 minute".to_string(),
            });
        }

        // Browsers drop SameSite=None cookies that are not also Secure
        if self.auth.session.cookie_same_site == SameSite::None && !self.auth.session.cookie_secure {
            return Err(Error::Internal {
                operation: "Config validation: cookie_same_site none requires cookie_secure".to_string(),
            });
        }

        let cors = &self.auth.security.cors;
        if cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty".to_string(),
            });
        }
        let has_wildcard = cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard));
        if has_wildcard && cors.allow_credentials {
            return Err(Error::Internal {
                operation: "Config validation: CORS wildcard origin cannot be combined with allow_credentials".to_string(),
            });
        }

        if let Some(admin_password) = &self.admin_password {
            if admin_password.len() < password.min_length {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: admin_password is shorter than the configured min_length ({})",
                        password.min_length
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("PORTAL_").ignore(&["config"]).split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
