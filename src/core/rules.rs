//! Visit transition rules
//!
//! Pure functions over domain values: the status state machine, reschedule
//! eligibility, the cancel window and the upcoming/past/canceled bucketing
//! used by user listings. Nothing here touches a store or the clock.

use crate::domain::{Result, SchedulerError, VisitStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Default cancel/reschedule window in hours
pub const DEFAULT_CANCEL_WINDOW_HOURS: f64 = 2.0;

/// Statuses reachable from `from` in one step
pub fn allowed_transitions(from: VisitStatus) -> &'static [VisitStatus] {
    use VisitStatus::*;
    match from {
        Pending => &[Confirmed, Canceled],
        Confirmed => &[InProgress, Completed, Canceled, NoShow],
        InProgress => &[Completed, NoShow, Canceled],
        Completed | Canceled | NoShow => &[],
    }
}

pub fn can_transition(from: VisitStatus, to: VisitStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Fails with [`SchedulerError::InvalidTransition`] unless `from -> to` is in the table
pub fn ensure_transition(from: VisitStatus, to: VisitStatus) -> Result<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(SchedulerError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Reschedule is only offered before the visit starts
pub fn can_reschedule(status: VisitStatus) -> bool {
    matches!(status, VisitStatus::Pending | VisitStatus::Confirmed)
}

pub fn ensure_reschedulable(status: VisitStatus) -> Result<()> {
    if can_reschedule(status) {
        Ok(())
    } else {
        Err(SchedulerError::InvalidTransition {
            from: status.to_string(),
            to: "rescheduled".to_string(),
        })
    }
}

/// Minimum lead time before a slot start for cancel and reschedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelWindow {
    lead: Duration,
}

impl CancelWindow {
    pub fn new(lead: Duration) -> Self {
        Self { lead }
    }

    /// Builds a window from fractional hours
    ///
    /// Non-finite or negative values fall back to the default window.
    pub fn from_hours(hours: f64) -> Self {
        let hours = if hours.is_finite() && hours >= 0.0 {
            hours
        } else {
            DEFAULT_CANCEL_WINDOW_HOURS
        };
        Self::new(Duration::milliseconds((hours * 3_600_000.0).round() as i64))
    }

    pub fn lead(&self) -> Duration {
        self.lead
    }

    /// Last instant (exclusive) at which changes are still accepted
    pub fn deadline(&self, slot_start: DateTime<Utc>) -> DateTime<Utc> {
        slot_start - self.lead
    }

    pub fn is_open(&self, slot_start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now < self.deadline(slot_start)
    }

    /// Fails with [`SchedulerError::CancelWindowExpired`] once `now` reaches the deadline
    pub fn ensure_open(&self, slot_start: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        if self.is_open(slot_start, now) {
            Ok(())
        } else {
            Err(SchedulerError::CancelWindowExpired {
                slot_start,
                deadline: self.deadline(slot_start),
            })
        }
    }
}

impl Default for CancelWindow {
    fn default() -> Self {
        Self::from_hours(DEFAULT_CANCEL_WINDOW_HOURS)
    }
}

/// Listing bucket for a user's visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitBucket {
    Upcoming,
    Past,
    Canceled,
}

/// Buckets a visit by status and slot start
///
/// A visit whose slot start is unknown is treated as past.
pub fn classify(
    status: VisitStatus,
    slot_start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> VisitBucket {
    match status {
        VisitStatus::Canceled => VisitBucket::Canceled,
        VisitStatus::Completed | VisitStatus::NoShow => VisitBucket::Past,
        _ => match slot_start {
            Some(start) if start > now => VisitBucket::Upcoming,
            _ => VisitBucket::Past,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use VisitStatus::*;

    #[test_case(Pending, Confirmed ; "pending to confirmed")]
    #[test_case(Pending, Canceled ; "pending to canceled")]
    #[test_case(Confirmed, InProgress ; "confirmed to in progress")]
    #[test_case(Confirmed, Completed ; "confirmed to completed")]
    #[test_case(Confirmed, Canceled ; "confirmed to canceled")]
    #[test_case(Confirmed, NoShow ; "confirmed to no show")]
    #[test_case(InProgress, Completed ; "in progress to completed")]
    #[test_case(InProgress, NoShow ; "in progress to no show")]
    #[test_case(InProgress, Canceled ; "in progress to canceled")]
    fn test_allowed_transition(from: VisitStatus, to: VisitStatus) {
        assert!(ensure_transition(from, to).is_ok());
    }

    #[test]
    fn test_table_has_exactly_nine_edges() {
        let edges: usize = VisitStatus::ALL
            .iter()
            .map(|s| allowed_transitions(*s).len())
            .sum();
        assert_eq!(edges, 9);
    }

    #[test]
    fn test_unlisted_pairs_rejected() {
        for from in VisitStatus::ALL {
            for to in VisitStatus::ALL {
                if allowed_transitions(from).contains(&to) {
                    continue;
                }
                let err = ensure_transition(from, to).unwrap_err();
                assert!(matches!(err, SchedulerError::InvalidTransition { .. }));
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for status in [Completed, Canceled, NoShow] {
            assert!(allowed_transitions(status).is_empty());
        }
    }

    #[test_case(Pending, true)]
    #[test_case(Confirmed, true)]
    #[test_case(InProgress, false)]
    #[test_case(Completed, false)]
    #[test_case(Canceled, false)]
    #[test_case(NoShow, false)]
    fn test_reschedule_eligibility(status: VisitStatus, expected: bool) {
        assert_eq!(can_reschedule(status), expected);
        assert_eq!(ensure_reschedulable(status).is_ok(), expected);
    }

    #[test]
    fn test_cancel_window_boundaries() {
        let window = CancelWindow::from_hours(2.0);
        let start = Utc::now() + Duration::days(1);

        assert!(window.ensure_open(start, start - Duration::hours(3)).is_ok());
        assert!(window.ensure_open(start, start - Duration::hours(1)).is_err());
        // deadline itself is already closed
        assert!(!window.is_open(start, start - Duration::hours(2)));
        assert!(window.is_open(start, start - Duration::hours(2) - Duration::milliseconds(1)));
    }

    #[test]
    fn test_cancel_window_error_carries_deadline() {
        let window = CancelWindow::default();
        let start = Utc::now();
        match window.ensure_open(start, start) {
            Err(SchedulerError::CancelWindowExpired { slot_start, deadline }) => {
                assert_eq!(slot_start, start);
                assert_eq!(deadline, start - Duration::hours(2));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_cancel_window_invalid_hours_fall_back() {
        assert_eq!(CancelWindow::from_hours(-1.0), CancelWindow::default());
        assert_eq!(CancelWindow::from_hours(f64::NAN), CancelWindow::default());
        assert_eq!(CancelWindow::from_hours(0.5).lead(), Duration::minutes(30));
        assert_eq!(CancelWindow::from_hours(0.0).lead(), Duration::zero());
    }

    #[test]
    fn test_bucketing() {
        let now = Utc::now();
        let future = Some(now + Duration::hours(1));
        let past = Some(now - Duration::hours(1));

        assert_eq!(classify(Confirmed, future, now), VisitBucket::Upcoming);
        assert_eq!(classify(Confirmed, past, now), VisitBucket::Past);
        assert_eq!(classify(Confirmed, Some(now), now), VisitBucket::Past);
        assert_eq!(classify(Canceled, future, now), VisitBucket::Canceled);
        assert_eq!(classify(Canceled, past, now), VisitBucket::Canceled);
        assert_eq!(classify(Completed, future, now), VisitBucket::Past);
        assert_eq!(classify(NoShow, future, now), VisitBucket::Past);
        assert_eq!(classify(Pending, None, now), VisitBucket::Past);
    }
}
