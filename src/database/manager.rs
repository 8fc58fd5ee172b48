use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// SQLSTATE for `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique constraint rejected the write; carries the offending field.
    #[error("Duplicate value for {0}")]
    UniqueViolation(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) =>
            {
                DatabaseError::UniqueViolation(field_for_constraint(db_err.constraint()))
            }
            other => DatabaseError::Sqlx(other),
        }
    }
}

/// Map a constraint name such as `users_email_key` to the column it guards.
fn field_for_constraint(constraint: Option<&str>) -> String {
    match constraint {
        Some(name) if name.contains("username") => "username".to_string(),
        Some(name) if name.contains("email") => "email".to_string(),
        _ => "value".to_string(),
    }
}

/// Build a connection URL from `DATABASE_URL` or the individual DB_* parts.
pub fn connection_url(config: &DatabaseConfig) -> Result<String, DatabaseError> {
    if let Some(raw) = &config.url {
        let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        return Ok(url.into());
    }

    if config.host.is_empty() {
        return Err(DatabaseError::ConfigMissing("DB_HOST"));
    }
    if config.name.is_empty() {
        return Err(DatabaseError::ConfigMissing("DB_NAME"));
    }

    let mut url = url::Url::parse("postgres://localhost").map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    url.set_host(Some(&config.host))
        .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    url.set_port(Some(config.port))
        .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    url.set_username(&config.user)
        .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    if !config.password.is_empty() {
        url.set_password(Some(&config.password))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    }
    url.set_path(&format!("/{}", config.name));
    if !config.ssl_mode.is_empty() {
        url.query_pairs_mut().append_pair("sslmode", &config.ssl_mode);
    }
    Ok(url.into())
}

/// Open the connection pool. No statement timeout is applied beyond driver defaults.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let connection_string = connection_url(config)?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(&connection_string)
        .await?;

    info!(
        "Created database pool for {}:{}/{} (max {} connections)",
        config.host, config.port, config.name, config.max_connections
    );
    Ok(pool)
}
