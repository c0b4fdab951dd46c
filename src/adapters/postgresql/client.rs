//! PostgreSQL client implementation
//!
//! Pooled connections with a per-statement timeout. Driver errors are
//! translated here: an undefined table becomes [`SchedulerError::MissingSchema`],
//! everything else [`SchedulerError::Database`].

use crate::config::schema::PostgreSQLConfig;
use crate::config::secret::redact_connection_string;
use crate::domain::{Result, SchedulerError};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

const SCHEMA_SQL: &str = include_str!("../../../migrations/001_visit_scheduling.sql");

/// Maps a driver error to the scheduler taxonomy
pub(crate) fn map_pg_error(context: &str, err: tokio_postgres::Error) -> SchedulerError {
    match err.code() {
        Some(code) if *code == SqlState::UNDEFINED_TABLE => {
            SchedulerError::MissingSchema(format!("{context}: {err}"))
        }
        _ => SchedulerError::Database(format!("{context}: {err}")),
    }
}

fn parse_ssl_mode(mode: &str) -> SslMode {
    match mode {
        "disable" => SslMode::Disable,
        "require" => SslMode::Require,
        _ => SslMode::Prefer,
    }
}

/// PostgreSQL client for the scheduling tables
pub struct PostgreSQLClient {
    pool: Pool,
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// No connection is opened until the first query.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the pool cannot be built.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                SchedulerError::Configuration(format!(
                    "Invalid PostgreSQL connection string: {}",
                    e
                ))
            })?;
        let ssl_mode = parse_ssl_mode(&config.ssl_mode);
        pg_config.ssl_mode(ssl_mode);
        pg_config.connect_timeout(Duration::from_secs(config.connection_timeout_seconds));

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let manager = if ssl_mode == SslMode::Disable {
            Manager::from_config(pg_config, NoTls, manager_config)
        } else {
            let connector = native_tls::TlsConnector::builder().build().map_err(|e| {
                SchedulerError::Configuration(format!("Failed to build TLS connector: {}", e))
            })?;
            Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
        };

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                SchedulerError::Database(format!("Failed to create connection pool: {}", e))
            })?;

        tracing::debug!(
            target_db = %redact_connection_string(config.connection_string.expose_secret().as_ref()),
            max_connections = config.max_connections,
            "PostgreSQL pool created"
        );

        Ok(Self { pool, config })
    }

    /// Checks out a connection with the statement timeout applied
    async fn connection(&self) -> Result<Object> {
        let client = self.pool.get().await.map_err(|e| {
            SchedulerError::Database(format!("Failed to get connection from pool: {}", e))
        })?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client
            .batch_execute(&timeout_query)
            .await
            .map_err(|e| map_pg_error("Failed to set statement timeout", e))?;

        Ok(client)
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| map_pg_error("Connection test failed", e))?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Creates the scheduling tables and indexes if they do not exist
    pub async fn apply_schema(&self) -> Result<()> {
        let client = self.connection().await?;
        client
            .batch_execute(SCHEMA_SQL)
            .await
            .map_err(|e| map_pg_error("Failed to apply schema", e))?;

        tracing::info!("PostgreSQL scheduling schema applied");
        Ok(())
    }

    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.connection().await?;
        client
            .query(query, params)
            .await
            .map_err(|e| map_pg_error("Query failed", e))
    }

    pub async fn query_opt(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>> {
        let client = self.connection().await?;
        client
            .query_opt(query, params)
            .await
            .map_err(|e| map_pg_error("Query failed", e))
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        let client = self.connection().await?;
        client
            .execute(statement, params)
            .await
            .map_err(|e| map_pg_error("Statement execution failed", e))
    }

    /// Connection string with the password masked
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(self.config.connection_string.expose_secret().as_ref())
    }

    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}
