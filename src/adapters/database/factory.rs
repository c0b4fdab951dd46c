//! Scheduler backend factory
//!
//! This module picks the storage family from configuration and assembles a
//! ready-to-use [`VisitScheduler`]. The choice is made once per
//! [`BackendSelector`]; callers never hold more than one backend at a time.

use crate::adapters::memory::MemoryStore;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{Environment, SchedulerConfig};
use crate::core::clock::Clock;
use crate::core::rules::CancelWindow;
use crate::core::scheduling::{BackendKind, DegradingScheduler, SchedulingService, VisitScheduler};
use crate::domain::{Result, SchedulerError};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Chooses the backend family for a configuration
///
/// Test runs and configurations without a `[postgresql]` section use the
/// in-memory backend; everything else is durable.
pub fn select_backend(config: &SchedulerConfig) -> BackendKind {
    if config.environment == Environment::Test || config.postgresql.is_none() {
        BackendKind::Memory
    } else {
        BackendKind::Durable
    }
}

/// Create a PostgreSQL client from the configuration
///
/// # Errors
///
/// Returns a configuration error if no `[postgresql]` section is present.
pub async fn create_postgresql_client(config: &SchedulerConfig) -> Result<PostgreSQLClient> {
    let pg_config = config.postgresql.as_ref().ok_or_else(|| {
        SchedulerError::Configuration(
            "No [postgresql] section or VISITS_DATABASE_URL configured".to_string(),
        )
    })?;
    PostgreSQLClient::new(pg_config.clone()).await
}

/// Builds a scheduling service over a fresh in-memory store
pub fn create_memory_scheduler(
    config: &SchedulerConfig,
    clock: Arc<dyn Clock>,
) -> Arc<dyn VisitScheduler> {
    let store = Arc::new(MemoryStore::new());
    Arc::new(SchedulingService::new(
        store.clone(),
        store,
        clock,
        CancelWindow::from_hours(config.visits.cancel_window_hours),
        config.visits.default_agent_id.clone(),
        BackendKind::Memory,
    ))
}

/// Create a visit scheduler based on the configuration
///
/// The durable scheduler wraps a PostgreSQL-backed service together with an
/// in-memory delegate used while the schema is missing outside production.
///
/// # Returns
///
/// Returns an Arc-wrapped trait object that implements [`VisitScheduler`]
///
/// # Errors
///
/// Returns an error if the PostgreSQL client cannot be created
pub async fn create_visit_scheduler(
    config: &SchedulerConfig,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn VisitScheduler>> {
    let backend = select_backend(config);
    match backend {
        BackendKind::Memory => {
            tracing::info!(backend = %backend, "Creating in-memory visit scheduler");
            Ok(create_memory_scheduler(config, clock))
        }
        BackendKind::Durable => {
            tracing::info!(backend = %backend, "Creating PostgreSQL visit scheduler");
            let client = create_postgresql_client(config).await?;
            let adapter = Arc::new(PostgreSQLAdapter::new(client));
            let primary: Arc<dyn VisitScheduler> = Arc::new(SchedulingService::new(
                adapter.clone(),
                adapter,
                clock.clone(),
                CancelWindow::from_hours(config.visits.cancel_window_hours),
                config.visits.default_agent_id.clone(),
                BackendKind::Durable,
            ));
            let fallback = create_memory_scheduler(config, clock);

            Ok(Arc::new(DegradingScheduler::new(
                primary,
                fallback,
                config.environment,
            )))
        }
    }
}

/// Builds the scheduler on first use and hands out the same instance after
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use visit_scheduler::adapters::database::BackendSelector;
/// use visit_scheduler::config::SchedulerConfig;
/// use visit_scheduler::core::clock::SystemClock;
///
/// # async fn example() -> visit_scheduler::domain::Result<()> {
/// let selector = BackendSelector::new(SchedulerConfig::default(), Arc::new(SystemClock));
/// let first = selector.scheduler().await?;
/// let second = selector.scheduler().await?;
/// assert!(Arc::ptr_eq(&first, &second));
/// # Ok(())
/// # }
/// ```
pub struct BackendSelector {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    scheduler: OnceCell<Arc<dyn VisitScheduler>>,
}

impl BackendSelector {
    pub fn new(config: SchedulerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            scheduler: OnceCell::new(),
        }
    }

    pub fn backend(&self) -> BackendKind {
        select_backend(&self.config)
    }

    /// Returns the cached scheduler, creating it on the first call
    ///
    /// # Errors
    ///
    /// Returns an error if the first creation fails; a later call retries.
    pub async fn scheduler(&self) -> Result<Arc<dyn VisitScheduler>> {
        self.scheduler
            .get_or_try_init(|| create_visit_scheduler(&self.config, self.clock.clone()))
            .await
            .cloned()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}
