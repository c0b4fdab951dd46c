//! Slot release after a committed visit update
//!
//! Once the visit row has moved, a failed slot release is logged and the
//! updated visit is still returned.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use visit_scheduler::adapters::database::{SlotStore, VisitStore};
use visit_scheduler::adapters::memory::MemoryStore;
use visit_scheduler::core::clock::ManualClock;
use visit_scheduler::core::rules::CancelWindow;
use visit_scheduler::core::scheduling::{
    BackendKind, CancelVisitRequest, CreateVisitRequest, RescheduleVisitRequest,
    SchedulingService, UpdateVisitStatusRequest, VisitScheduler,
};
use visit_scheduler::domain::{
    HistoryEvent, IdempotencyKey, ListingId, Result, SchedulerError, Slot, SlotId, SlotStatus,
    UserId, VisitStatus,
};

const SLOT: &str = "mock-slot-2025-01-15-09:00";

/// Slot store that cannot reopen slots
struct StuckRelease {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl SlotStore for StuckRelease {
    async fn get_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        self.inner.get_slot(slot_id).await
    }

    async fn reserve_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        self.inner.reserve_slot(slot_id).await
    }

    async fn release_slot(&self, _slot_id: &SlotId) -> Result<()> {
        Err(SchedulerError::Database("connection reset".to_string()))
    }

    async fn insert_slot_if_absent(&self, slot: Slot) -> Result<Slot> {
        self.inner.insert_slot_if_absent(slot).await
    }
}

fn setup() -> (SchedulingService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
    let service = SchedulingService::new(
        Arc::new(StuckRelease {
            inner: store.clone(),
        }),
        store.clone(),
        Arc::new(ManualClock::new(now)),
        CancelWindow::new(Duration::hours(2)),
        "agent_001",
        BackendKind::Memory,
    );
    (service, store)
}

async fn book(service: &SchedulingService) -> visit_scheduler::domain::Visit {
    service
        .create_visit(&CreateVisitRequest::new(
            ListingId::new("listing-1").unwrap(),
            SlotId::new(SLOT).unwrap(),
            UserId::new("user-1").unwrap(),
            IdempotencyKey::new("key-1").unwrap(),
        ))
        .await
        .unwrap()
        .visit()
        .clone()
}

#[tokio::test]
async fn test_cancel_succeeds_when_release_fails() {
    let (service, store) = setup();
    let visit = book(&service).await;

    let canceled = service
        .cancel_visit(&CancelVisitRequest::new(visit.id.clone()).with_reason("viaje"))
        .await
        .unwrap();
    assert_eq!(canceled.status, VisitStatus::Canceled);

    let stored = store.find_by_id(&visit.id).await.unwrap().unwrap();
    assert_eq!(stored.status, VisitStatus::Canceled);

    let history = store.list_history(&visit.id).await.unwrap();
    assert_eq!(history.last().unwrap().event, HistoryEvent::StatusChanged);
}

#[tokio::test]
async fn test_admin_cancel_succeeds_when_release_fails() {
    let (service, _) = setup();
    let visit = book(&service).await;

    let updated = service
        .update_visit_status(&UpdateVisitStatusRequest::new(
            visit.id.clone(),
            VisitStatus::Canceled,
        ))
        .await
        .unwrap();
    assert_eq!(updated.status, VisitStatus::Canceled);
}

#[tokio::test]
async fn test_reschedule_succeeds_when_old_slot_release_fails() {
    let (service, store) = setup();
    let visit = book(&service).await;
    let next = SlotId::new("mock-slot-2025-01-16-10:00").unwrap();

    let outcome = service
        .reschedule_visit(&RescheduleVisitRequest::new(visit.id.clone(), next.clone()))
        .await
        .unwrap();

    assert_eq!(outcome.visit.slot_id, next);
    assert_eq!(outcome.next_slot.status, SlotStatus::Confirmed);
    // The old slot could not be reopened and is reported as it is stored
    assert_eq!(outcome.previous_slot.status, SlotStatus::Confirmed);

    let stored = store.find_by_id(&visit.id).await.unwrap().unwrap();
    assert_eq!(stored.slot_id, next);
}
