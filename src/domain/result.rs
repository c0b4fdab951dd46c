//! Result type alias for scheduler operations

use super::errors::SchedulerError;

/// Result type alias using [`SchedulerError`]
///
/// # Examples
///
/// ```
/// use visit_scheduler::domain::result::Result;
/// use visit_scheduler::domain::errors::SchedulerError;
///
/// fn lookup() -> Result<String> {
///     Err(SchedulerError::VisitNotFound("visit_1".to_string()))
/// }
///
/// assert!(lookup().is_err());
/// ```
pub type Result<T> = std::result::Result<T, SchedulerError>;
