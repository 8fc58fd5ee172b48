use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Default token lifetime when nothing (or nothing usable) is configured.
pub const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY must be set")]
    MissingSecret,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub admin: Option<AdminBootstrap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

impl FromStr for DatabaseBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    /// Full connection URL; takes precedence over the individual DB_* parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: String,
    pub max_connections: u32,
    /// Pool acquire timeout in seconds.
    pub connection_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub default_page_limit: i64,
    pub max_page_limit: i64,
}

/// How `POST /api/auth/refresh` derives the claims of the new token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Re-read the account and sign its current username, email and role.
    ReloadAccount,
    /// Re-sign whatever the presented token claims.
    TrustClaims,
}

impl FromStr for RefreshPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reload" | "reload_account" => Ok(Self::ReloadAccount),
            "trust" | "trust_claims" => Ok(Self::TrustClaims),
            _ => Err(()),
        }
    }
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
    pub refresh_policy: RefreshPolicy,
    pub cors_origins: Vec<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_expiry_hours", &self.token_expiry_hours)
            .field("refresh_policy", &self.refresh_policy)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

/// Account created at startup with the admin role, if not already present.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let secret = lookup("JWT_SECRET_KEY").unwrap_or_default();
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        let base = match environment {
            Environment::Production => Self::production(secret),
            Environment::Staging => Self::staging(secret),
            Environment::Development => Self::development(secret),
        };

        base.with_overrides(&lookup)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        self.server.port = parsed(lookup, "PORT", self.server.port);

        // Security
        self.security.token_expiry_hours = token_expiry_hours(lookup("TOKEN_EXPIRATION_HOURS"));
        if let Some(v) = lookup("SECURITY_TOKEN_REFRESH_POLICY") {
            self.security.refresh_policy = v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "SECURITY_TOKEN_REFRESH_POLICY",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Database
        if let Some(v) = lookup("DATABASE_BACKEND") {
            self.database.backend = v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "DATABASE_BACKEND",
                value: v.clone(),
            })?;
        }
        self.database.url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        self.database.port = parsed(lookup, "DB_PORT", self.database.port);
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DB_SSLMODE") {
            self.database.ssl_mode = v;
        }
        self.database.max_connections =
            parsed(lookup, "DATABASE_MAX_CONNECTIONS", self.database.max_connections);
        self.database.connection_timeout =
            parsed(lookup, "DATABASE_CONNECTION_TIMEOUT", self.database.connection_timeout);

        // API
        self.api.default_page_limit =
            parsed(lookup, "API_DEFAULT_PAGE_LIMIT", self.api.default_page_limit).max(1);
        self.api.max_page_limit = parsed(lookup, "API_MAX_PAGE_LIMIT", self.api.max_page_limit)
            .max(self.api.default_page_limit);

        // Admin bootstrap needs all three parts
        self.admin = match (
            lookup("ADMIN_USERNAME"),
            lookup("ADMIN_EMAIL"),
            lookup("ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password))
                if !username.is_empty() && !email.is_empty() && !password.is_empty() =>
            {
                Some(AdminBootstrap { username, email, password })
            }
            (None, None, None) => None,
            _ => {
                tracing::warn!("ADMIN_USERNAME, ADMIN_EMAIL and ADMIN_PASSWORD must all be set; skipping admin bootstrap");
                None
            }
        };

        Ok(self)
    }

    fn development(jwt_secret: String) -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig::defaults(10, 30),
            api: ApiConfig {
                default_page_limit: 10,
                max_page_limit: 1000,
            },
            security: SecurityConfig {
                jwt_secret,
                token_expiry_hours: DEFAULT_TOKEN_EXPIRY_HOURS,
                refresh_policy: RefreshPolicy::ReloadAccount,
                cors_origins: vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:3000".to_string(),
                ],
            },
            admin: None,
        }
    }

    fn staging(jwt_secret: String) -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig::defaults(20, 10),
            api: ApiConfig {
                default_page_limit: 10,
                max_page_limit: 500,
            },
            security: SecurityConfig {
                jwt_secret,
                token_expiry_hours: DEFAULT_TOKEN_EXPIRY_HOURS,
                refresh_policy: RefreshPolicy::ReloadAccount,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            admin: None,
        }
    }

    fn production(jwt_secret: String) -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig::defaults(50, 5),
            api: ApiConfig {
                default_page_limit: 10,
                max_page_limit: 100,
            },
            security: SecurityConfig {
                jwt_secret,
                token_expiry_hours: DEFAULT_TOKEN_EXPIRY_HOURS,
                refresh_policy: RefreshPolicy::ReloadAccount,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            admin: None,
        }
    }
}

impl DatabaseConfig {
    fn defaults(max_connections: u32, connection_timeout: u64) -> Self {
        Self {
            backend: DatabaseBackend::Postgres,
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "petstore".to_string(),
            ssl_mode: "disable".to_string(),
            max_connections,
            connection_timeout,
        }
    }
}

/// Non-numeric or non-positive values fall back to the default with a warning.
fn token_expiry_hours(raw: Option<String>) -> i64 {
    match raw {
        None => DEFAULT_TOKEN_EXPIRY_HOURS,
        Some(s) => match s.trim().parse::<i64>() {
            Ok(v) if v > 0 => v,
            _ => {
                tracing::warn!("invalid TOKEN_EXPIRATION_HOURS '{}', defaulting to {}", s, DEFAULT_TOKEN_EXPIRY_HOURS);
                DEFAULT_TOKEN_EXPIRY_HOURS
            }
        },
    }
}

fn parsed<F, T>(lookup: &F, name: &str, current: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring invalid {}='{}'", name, v);
            current
        }),
        None => current,
    }
}
