//! Logging and observability
//!
//! Structured `tracing` output to the console and, optionally, rotating JSON
//! files. Scheduling code logs with fields (`visit_id`, `slot_id`,
//! `idempotency_key`, `backend`) rather than interpolated messages.

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a visit lifecycle event
///
/// # Example
///
/// ```no_run
/// use visit_scheduler::log_visit_event;
///
/// log_visit_event!("created", "visit_1", "mock-slot-2025-01-15-09:00");
/// ```
#[macro_export]
macro_rules! log_visit_event {
    ($event:expr, $visit_id:expr, $slot_id:expr) => {
        tracing::info!(
            event = $event,
            visit_id = %$visit_id,
            slot_id = %$slot_id,
            "Visit event"
        );
    };
}

/// Log a failed best-effort side effect without failing the caller
///
/// # Example
///
/// ```no_run
/// use visit_scheduler::log_best_effort_failure;
/// use visit_scheduler::domain::SchedulerError;
///
/// let error = SchedulerError::Database("timeout".to_string());
/// log_best_effort_failure!("history", "visit_1", &error);
/// ```
#[macro_export]
macro_rules! log_best_effort_failure {
    ($effect:expr, $visit_id:expr, $error:expr) => {
        tracing::warn!(
            effect = $effect,
            visit_id = %$visit_id,
            error = %$error,
            "Best-effort side effect failed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use visit_scheduler::log_error_with_context;
/// use visit_scheduler::domain::SchedulerError;
///
/// let error = SchedulerError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
