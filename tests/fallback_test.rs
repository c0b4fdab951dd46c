//! Degraded-mode tests for the durable scheduler
//!
//! The "durable" store here fails every call, either with a missing-schema
//! error or with a generic database error.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use visit_scheduler::adapters::database::{InsertOutcome, SlotStore, VisitStore};
use visit_scheduler::adapters::memory::MemoryStore;
use visit_scheduler::config::Environment;
use visit_scheduler::core::clock::ManualClock;
use visit_scheduler::core::rules::CancelWindow;
use visit_scheduler::core::scheduling::{
    BackendKind, CancelVisitRequest, CreateVisitRequest, DegradingScheduler, SchedulingService,
    VisitScheduler,
};
use visit_scheduler::domain::{
    ContactInfo, IdempotencyKey, ListingId, Result, SchedulerError, Slot, SlotId, UserId, Visit,
    VisitHistoryEntry, VisitId, VisitStatus,
};

#[derive(Clone, Copy)]
enum Failure {
    MissingSchema,
    Database,
}

/// Store whose every call fails the same way
struct BrokenStore {
    failure: Failure,
}

impl BrokenStore {
    fn fail<T>(&self) -> Result<T> {
        Err(match self.failure {
            Failure::MissingSchema => {
                SchedulerError::MissingSchema("relation \"visits\" does not exist".to_string())
            }
            Failure::Database => SchedulerError::Database("connection reset".to_string()),
        })
    }
}

#[async_trait]
impl SlotStore for BrokenStore {
    async fn get_slot(&self, _slot_id: &SlotId) -> Result<Option<Slot>> {
        self.fail()
    }

    async fn reserve_slot(&self, _slot_id: &SlotId) -> Result<Option<Slot>> {
        self.fail()
    }

    async fn release_slot(&self, _slot_id: &SlotId) -> Result<()> {
        self.fail()
    }

    async fn insert_slot_if_absent(&self, _slot: Slot) -> Result<Slot> {
        self.fail()
    }
}

#[async_trait]
impl VisitStore for BrokenStore {
    async fn find_by_idempotency_key(&self, _key: &IdempotencyKey) -> Result<Option<Visit>> {
        self.fail()
    }

    async fn find_by_id(&self, _visit_id: &VisitId) -> Result<Option<Visit>> {
        self.fail()
    }

    async fn insert_visit(&self, _visit: Visit) -> Result<InsertOutcome> {
        self.fail()
    }

    async fn update_status(&self, _visit_id: &VisitId, _status: VisitStatus) -> Result<Visit> {
        self.fail()
    }

    async fn update_slot_and_status(
        &self,
        _visit_id: &VisitId,
        _slot_id: &SlotId,
        _listing_id: Option<&ListingId>,
        _status: VisitStatus,
    ) -> Result<Visit> {
        self.fail()
    }

    async fn list_by_user(&self, _user_id: &UserId) -> Result<Vec<Visit>> {
        self.fail()
    }

    async fn append_history(&self, _entry: VisitHistoryEntry) -> Result<()> {
        self.fail()
    }

    async fn list_history(&self, _visit_id: &VisitId) -> Result<Vec<VisitHistoryEntry>> {
        self.fail()
    }

    async fn save_contact(&self, _visit_id: &VisitId, _contact: &ContactInfo) -> Result<()> {
        self.fail()
    }

    async fn find_contact(&self, _visit_id: &VisitId) -> Result<Option<ContactInfo>> {
        self.fail()
    }
}

fn scheduler(failure: Failure, environment: Environment) -> (DegradingScheduler, Arc<MemoryStore>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap(),
    ));
    let broken = Arc::new(BrokenStore { failure });
    let primary = Arc::new(SchedulingService::new(
        broken.clone(),
        broken,
        clock.clone(),
        CancelWindow::new(Duration::hours(2)),
        "agent_001",
        BackendKind::Durable,
    ));
    let memory = Arc::new(MemoryStore::new());
    let fallback = Arc::new(SchedulingService::new(
        memory.clone(),
        memory.clone(),
        clock,
        CancelWindow::new(Duration::hours(2)),
        "agent_001",
        BackendKind::Memory,
    ));
    (
        DegradingScheduler::new(primary, fallback, environment),
        memory,
    )
}

fn request() -> CreateVisitRequest {
    CreateVisitRequest::new(
        ListingId::new("listing-1").unwrap(),
        SlotId::new("mock-slot-2025-01-15-09:00").unwrap(),
        UserId::new("user-1").unwrap(),
        IdempotencyKey::new("key-1").unwrap(),
    )
}

#[tokio::test]
async fn test_missing_schema_degrades_outside_production() {
    let (scheduler, memory) = scheduler(Failure::MissingSchema, Environment::Development);

    let outcome = scheduler.create_visit(&request()).await.unwrap();
    assert!(!outcome.is_idempotent());
    assert_eq!(scheduler.backend(), BackendKind::Durable);
    assert_eq!(memory.visit_count().await, 1);

    // Follow-up calls keep landing on the delegate
    let replay = scheduler.create_visit(&request()).await.unwrap();
    assert!(replay.is_idempotent());

    let canceled = scheduler
        .cancel_visit(&CancelVisitRequest::new(outcome.visit().id.clone()))
        .await
        .unwrap();
    assert_eq!(canceled.status, VisitStatus::Canceled);

    let grouped = scheduler
        .get_visits_by_user(&UserId::new("user-1").unwrap())
        .await
        .unwrap();
    assert_eq!(grouped.canceled.len(), 1);
}

#[tokio::test]
async fn test_staging_also_degrades() {
    let (scheduler, memory) = scheduler(Failure::MissingSchema, Environment::Staging);
    scheduler.create_visit(&request()).await.unwrap();
    assert_eq!(memory.visit_count().await, 1);
}

#[tokio::test]
async fn test_production_propagates_missing_schema() {
    let (scheduler, memory) = scheduler(Failure::MissingSchema, Environment::Production);

    let err = scheduler.create_visit(&request()).await.unwrap_err();
    assert!(err.is_missing_schema());
    assert_eq!(err.code(), "INTERNAL_ERROR");
    assert_eq!(memory.visit_count().await, 0);
}

#[tokio::test]
async fn test_other_database_errors_never_degrade() {
    let (scheduler, memory) = scheduler(Failure::Database, Environment::Development);

    let err = scheduler.create_visit(&request()).await.unwrap_err();
    assert!(matches!(err, SchedulerError::Database(_)));
    assert_eq!(memory.visit_count().await, 0);

    let err = scheduler
        .get_visit(&VisitId::new("visit_1").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Database(_)));
}
