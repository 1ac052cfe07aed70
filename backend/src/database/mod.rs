use crate::error::AppError;
use queen_of_hearts_shared::constants::{
    DB_CONNECTION_TIMEOUT_SECONDS, DB_MAX_CONNECTIONS, DB_MIN_CONNECTIONS,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DB_MAX_CONNECTIONS,
            min_connections: DB_MIN_CONNECTIONS,
            connect_timeout: Duration::from_secs(DB_CONNECTION_TIMEOUT_SECONDS),
        }
    }
}

/// Database instance with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database instance with connection pooling
    pub async fn new(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run embedded database migrations
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    /// Check database connectivity
    pub async fn health_check(&self) -> Result<DatabaseHealth, AppError> {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let response_time = start.elapsed();

        match result {
            Ok(_) => Ok(DatabaseHealth {
                is_healthy: true,
                response_time_ms: response_time.as_millis() as u64,
                active_connections: self.pool.size(),
                error: None,
            }),
            Err(e) => Ok(DatabaseHealth {
                is_healthy: false,
                response_time_ms: response_time.as_millis() as u64,
                active_connections: 0,
                error: Some(e.to_string()),
            }),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseHealth {
    pub is_healthy: bool,
    pub response_time_ms: u64,
    pub active_connections: u32,
    pub error: Option<String>,
}
