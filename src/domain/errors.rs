//! Domain error types
//!
//! Every failure the scheduler returns to its caller is a [`SchedulerError`].
//! Store adapters translate driver errors into these variants so no
//! third-party error type crosses the store boundary.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main scheduler error type
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Slot missing, unparseable or already taken
    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    /// Target visit does not exist
    #[error("Visit not found: {0}")]
    VisitNotFound(String),

    /// Requested status change violates the visit state machine
    #[error("Invalid visit transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Time-gated operation attempted too close to the slot start
    #[error("Cancel window expired: slot starts at {slot_start}, changes allowed until {deadline}")]
    CancelWindowExpired {
        slot_start: DateTime<Utc>,
        deadline: DateTime<Utc>,
    },

    /// Durable store lacks the scheduling tables
    #[error("Missing schema: {0}")]
    MissingSchema(String),

    /// Store errors (generic)
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl SchedulerError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::SlotUnavailable(_) => "SLOT_UNAVAILABLE",
            Self::VisitNotFound(_) => "VISIT_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_VISIT_TRANSITION",
            Self::CancelWindowExpired { .. } => "CANCEL_WINDOW_EXPIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    /// HTTP status a request layer should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            Self::SlotUnavailable(_)
            | Self::InvalidTransition { .. }
            | Self::CancelWindowExpired { .. } => 409,
            Self::VisitNotFound(_) => 404,
            Self::Validation(_) => 400,
            _ => 500,
        }
    }

    /// True when the durable store reported its tables are absent
    pub fn is_missing_schema(&self) -> bool {
        matches!(self, Self::MissingSchema(_))
    }

    /// True for rejections caused by the request rather than the system
    pub fn is_domain_rejection(&self) -> bool {
        self.http_status() < 500
    }
}

impl From<std::io::Error> for SchedulerError {
    fn from(err: std::io::Error) -> Self {
        SchedulerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SchedulerError {
    fn from(err: toml::de::Error) -> Self {
        SchedulerError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_error_display() {
        let err = SchedulerError::InvalidTransition {
            from: "completed".to_string(),
            to: "pending".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid visit transition from completed to pending"
        );
    }

    #[test]
    fn test_codes_and_statuses() {
        let start = Utc::now();
        let cases = [
            (SchedulerError::SlotUnavailable("s".into()), "SLOT_UNAVAILABLE", 409),
            (SchedulerError::VisitNotFound("v".into()), "VISIT_NOT_FOUND", 404),
            (
                SchedulerError::CancelWindowExpired {
                    slot_start: start,
                    deadline: start - Duration::hours(2),
                },
                "CANCEL_WINDOW_EXPIRED",
                409,
            ),
            (SchedulerError::Validation("bad".into()), "VALIDATION_ERROR", 400),
            (SchedulerError::Database("down".into()), "INTERNAL_ERROR", 500),
            (SchedulerError::MissingSchema("visits".into()), "INTERNAL_ERROR", 500),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.http_status(), status);
        }
    }

    #[test]
    fn test_missing_schema_detection() {
        assert!(SchedulerError::MissingSchema("visit_slots".into()).is_missing_schema());
        assert!(!SchedulerError::Database("timeout".into()).is_missing_schema());
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: SchedulerError = toml_err.into();
        assert!(matches!(err, SchedulerError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: SchedulerError = io_err.into();
        assert!(matches!(err, SchedulerError::Io(_)));
    }
}
