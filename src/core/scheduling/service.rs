//! Store-backed scheduling service
//!
//! Every operation calls the slot store before the visit store. The only
//! mutual-exclusion primitive is [`SlotStore::reserve_slot`]; the idempotency
//! index on the visit store breaks ties between creators sharing a key.

use crate::adapters::database::traits::{InsertOutcome, SlotStore, VisitStore};
use crate::core::clock::Clock;
use crate::core::rules::{self, CancelWindow, VisitBucket};
use crate::core::scheduling::{
    BackendKind, CancelVisitRequest, CreateVisitOutcome, CreateVisitRequest, RescheduleOutcome,
    RescheduleVisitRequest, UpdateVisitStatusRequest, UserVisits, VisitScheduler, VisitSummary,
};
use crate::domain::{
    Actor, HistoryEvent, ListingId, Result, SchedulerError, Slot, SlotId, UserId, Visit,
    VisitHistoryEntry, VisitId, VisitStatus,
};
use crate::{log_best_effort_failure, log_visit_event};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde_json::json;
use std::sync::Arc;

/// Scheduling service over a slot store and a visit store
pub struct SchedulingService {
    slots: Arc<dyn SlotStore + Send + Sync>,
    visits: Arc<dyn VisitStore + Send + Sync>,
    clock: Arc<dyn Clock>,
    cancel_window: CancelWindow,
    agent_id: String,
    backend: BackendKind,
}

impl SchedulingService {
    /// Create a service
    ///
    /// # Arguments
    ///
    /// * `slots` - Slot availability store
    /// * `visits` - Visit, history and contact store
    /// * `clock` - Source of "now" for windows and bucketing
    /// * `cancel_window` - Lead time required for cancel and reschedule
    /// * `agent_id` - Agent assigned to every new visit
    /// * `backend` - Storage family reported by [`VisitScheduler::backend`]
    pub fn new(
        slots: Arc<dyn SlotStore + Send + Sync>,
        visits: Arc<dyn VisitStore + Send + Sync>,
        clock: Arc<dyn Clock>,
        cancel_window: CancelWindow,
        agent_id: impl Into<String>,
        backend: BackendKind,
    ) -> Self {
        Self {
            slots,
            visits,
            clock,
            cancel_window,
            agent_id: agent_id.into(),
            backend,
        }
    }

    pub fn cancel_window(&self) -> CancelWindow {
        self.cancel_window
    }

    async fn load_visit(&self, visit_id: &VisitId) -> Result<Visit> {
        self.visits
            .find_by_id(visit_id)
            .await?
            .ok_or_else(|| SchedulerError::VisitNotFound(visit_id.to_string()))
    }

    async fn load_visit_slot(&self, visit: &Visit) -> Result<Slot> {
        self.slots.get_slot(&visit.slot_id).await?.ok_or_else(|| {
            SchedulerError::SlotUnavailable(format!(
                "Slot {} of visit {} not found",
                visit.slot_id, visit.id
            ))
        })
    }

    /// Fetches a slot, materialising it from a synthetic id on first reference
    async fn resolve_slot(
        &self,
        slot_id: &SlotId,
        listing_id: &ListingId,
        now: DateTime<Utc>,
    ) -> Result<Slot> {
        if let Some(slot) = self.slots.get_slot(slot_id).await? {
            return Ok(slot);
        }
        match self
            .slots
            .materialize_synthetic_slot(slot_id, listing_id, now)
            .await?
        {
            Some(slot) => {
                tracing::debug!(slot_id = %slot_id, listing_id = %listing_id, "Materialized synthetic slot");
                Ok(slot)
            }
            None => Err(SchedulerError::SlotUnavailable(format!(
                "Slot {slot_id} does not exist"
            ))),
        }
    }

    async fn reserve(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        self.slots.reserve_slot(slot_id).await
    }

    async fn replay(&self, visit: Visit) -> Result<CreateVisitOutcome> {
        let slot = self.load_visit_slot(&visit).await?;
        tracing::debug!(
            visit_id = %visit.id,
            idempotency_key = %visit.idempotency_key,
            "Replaying visit for idempotency key"
        );
        Ok(CreateVisitOutcome::Replayed { visit, slot })
    }

    async fn release_best_effort(&self, slot_id: &SlotId, visit_id: &VisitId) {
        if let Err(e) = self.slots.release_slot(slot_id).await {
            log_best_effort_failure!("slot_release", visit_id, e);
        }
    }

    async fn record_history(&self, entry: VisitHistoryEntry) {
        let visit_id = entry.visit_id.clone();
        if let Err(e) = self.visits.append_history(entry).await {
            log_best_effort_failure!("history", visit_id, e);
        }
    }

    async fn apply_status(
        &self,
        visit: Visit,
        status: VisitStatus,
        reason: Option<String>,
        actor: Actor,
    ) -> Result<Visit> {
        let updated = self.visits.update_status(&visit.id, status).await?;

        if status == VisitStatus::Canceled {
            self.release_best_effort(&visit.slot_id, &visit.id).await;
        }

        let entry = VisitHistoryEntry::new(
            visit.id.clone(),
            HistoryEvent::StatusChanged,
            actor,
            self.clock.now(),
        )
        .with_status(Some(visit.status), status)
        .with_slots(Some(visit.slot_id.clone()), visit.slot_id.clone())
        .with_reason(reason);
        self.record_history(entry).await;

        log_visit_event!(HistoryEvent::StatusChanged.as_str(), updated.id, updated.slot_id);
        Ok(updated)
    }
}

#[async_trait]
impl VisitScheduler for SchedulingService {
    fn backend(&self) -> BackendKind {
        self.backend
    }

    async fn create_visit(&self, request: &CreateVisitRequest) -> Result<CreateVisitOutcome> {
        if let Some(existing) = self
            .visits
            .find_by_idempotency_key(&request.idempotency_key)
            .await?
        {
            return self.replay(existing).await;
        }

        let now = self.clock.now();
        self.resolve_slot(&request.slot_id, &request.listing_id, now)
            .await?;

        let slot = match self.reserve(&request.slot_id).await? {
            Some(slot) => slot,
            None => {
                // A concurrent creator with the same key may hold the slot
                if let Some(existing) = self
                    .visits
                    .find_by_idempotency_key(&request.idempotency_key)
                    .await?
                {
                    return self.replay(existing).await;
                }
                tracing::info!(slot_id = %request.slot_id, "Slot already taken");
                return Err(SchedulerError::SlotUnavailable(format!(
                    "Slot {} is not open",
                    request.slot_id
                )));
            }
        };

        let candidate = Visit {
            id: VisitId::generate(),
            listing_id: request.listing_id.clone(),
            slot_id: request.slot_id.clone(),
            user_id: request.user_id.clone(),
            status: VisitStatus::Confirmed,
            idempotency_key: request.idempotency_key.clone(),
            agent_id: self.agent_id.clone(),
            channel: request.channel,
            created_at: now,
        };
        let candidate_id = candidate.id.clone();

        let visit = match self.visits.insert_visit(candidate).await {
            Ok(InsertOutcome::Inserted(visit)) => visit,
            Ok(InsertOutcome::DuplicateKey) => {
                tracing::info!(
                    idempotency_key = %request.idempotency_key,
                    slot_id = %request.slot_id,
                    "Lost idempotency race, releasing reservation"
                );
                self.release_best_effort(&request.slot_id, &candidate_id)
                    .await;
                let winner = self
                    .visits
                    .find_by_idempotency_key(&request.idempotency_key)
                    .await?
                    .ok_or_else(|| {
                        SchedulerError::Database(format!(
                            "Idempotency key {} reported duplicate but no visit was found",
                            request.idempotency_key
                        ))
                    })?;
                return self.replay(winner).await;
            }
            Err(e) => {
                self.release_best_effort(&request.slot_id, &candidate_id)
                    .await;
                return Err(e);
            }
        };

        if let Some(contact) = request.contact.as_ref().filter(|c| c.is_persistable()) {
            if let Err(e) = self.visits.save_contact(&visit.id, &contact.normalized()).await {
                log_best_effort_failure!("contact", visit.id, e);
            }
        }

        let entry = VisitHistoryEntry::new(
            visit.id.clone(),
            HistoryEvent::Created,
            Actor::system(),
            now,
        )
        .with_status(None, visit.status)
        .with_slots(None, visit.slot_id.clone());
        self.record_history(entry).await;

        log_visit_event!(HistoryEvent::Created.as_str(), visit.id, visit.slot_id);
        Ok(CreateVisitOutcome::Created { visit, slot })
    }

    async fn cancel_visit(&self, request: &CancelVisitRequest) -> Result<Visit> {
        let visit = self.load_visit(&request.visit_id).await?;
        rules::ensure_transition(visit.status, VisitStatus::Canceled)?;

        let slot = self.load_visit_slot(&visit).await?;
        self.cancel_window
            .ensure_open(slot.start_time, self.clock.now())?;

        let actor = request.actor.clone().unwrap_or_else(|| Actor::user(None));
        self.apply_status(visit, VisitStatus::Canceled, request.reason.clone(), actor)
            .await
    }

    async fn update_visit_status(&self, request: &UpdateVisitStatusRequest) -> Result<Visit> {
        let visit = self.load_visit(&request.visit_id).await?;
        rules::ensure_transition(visit.status, request.status)?;

        let actor = request.actor.clone().unwrap_or_else(|| Actor::admin(None));
        self.apply_status(visit, request.status, request.reason.clone(), actor)
            .await
    }

    async fn reschedule_visit(
        &self,
        request: &RescheduleVisitRequest,
    ) -> Result<RescheduleOutcome> {
        let visit = self.load_visit(&request.visit_id).await?;
        rules::ensure_reschedulable(visit.status)?;

        let now = self.clock.now();
        let previous_slot = self.load_visit_slot(&visit).await?;
        self.cancel_window.ensure_open(previous_slot.start_time, now)?;

        let target_listing = request
            .listing_id
            .clone()
            .unwrap_or_else(|| visit.listing_id.clone());
        self.resolve_slot(&request.slot_id, &target_listing, now)
            .await?;
        let next_slot = self.reserve(&request.slot_id).await?.ok_or_else(|| {
            SchedulerError::SlotUnavailable(format!("Slot {} is not open", request.slot_id))
        })?;

        let updated = match self
            .visits
            .update_slot_and_status(
                &visit.id,
                &request.slot_id,
                request.listing_id.as_ref(),
                VisitStatus::Confirmed,
            )
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.release_best_effort(&request.slot_id, &visit.id).await;
                return Err(e);
            }
        };

        self.release_best_effort(&previous_slot.id, &visit.id).await;
        let previous_slot = self
            .slots
            .get_slot(&previous_slot.id)
            .await?
            .unwrap_or(previous_slot);

        let actor = request.actor.clone().unwrap_or_else(|| Actor::user(None));
        let entry = VisitHistoryEntry::new(visit.id.clone(), HistoryEvent::Rescheduled, actor, now)
            .with_status(Some(visit.status), VisitStatus::Confirmed)
            .with_slots(Some(visit.slot_id.clone()), request.slot_id.clone())
            .with_reason(request.reason.clone())
            .with_metadata(json!({
                "previous_slot_start": previous_slot.start_time.to_rfc3339(),
                "next_slot_start": next_slot.start_time.to_rfc3339(),
            }));
        self.record_history(entry).await;

        log_visit_event!(HistoryEvent::Rescheduled.as_str(), updated.id, updated.slot_id);
        Ok(RescheduleOutcome {
            visit: updated,
            previous_slot,
            next_slot,
        })
    }

    async fn get_visits_by_user(&self, user_id: &UserId) -> Result<UserVisits> {
        let visits = self.visits.list_by_user(user_id).await?;
        let slots = try_join_all(visits.iter().map(|v| self.slots.get_slot(&v.slot_id))).await?;

        let now = self.clock.now();
        let mut grouped = UserVisits::default();
        for (visit, slot) in visits.into_iter().zip(slots) {
            let slot_start = slot.map(|s| s.start_time);
            let bucket = rules::classify(visit.status, slot_start, now);
            let summary = VisitSummary { visit, slot_start };
            match bucket {
                VisitBucket::Upcoming => grouped.upcoming.push(summary),
                VisitBucket::Past => grouped.past.push(summary),
                VisitBucket::Canceled => grouped.canceled.push(summary),
            }
        }
        Ok(grouped)
    }

    async fn get_visit(&self, visit_id: &VisitId) -> Result<Option<Visit>> {
        self.visits.find_by_id(visit_id).await
    }

    async fn visit_history(&self, visit_id: &VisitId) -> Result<Vec<VisitHistoryEntry>> {
        self.visits.list_history(visit_id).await
    }

    async fn get_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        self.slots.get_slot(slot_id).await
    }

    async fn publish_slot(&self, slot: Slot) -> Result<Slot> {
        self.slots.insert_slot_if_absent(slot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::core::clock::ManualClock;
    use crate::domain::{ContactInfo, IdempotencyKey, SlotStatus};
    use chrono::{Duration, TimeZone};

    const SLOT: &str = "mock-slot-2025-01-15-09:00";

    fn slot_start() -> DateTime<Utc> {
        // 09:00 at UTC-03:00
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    fn setup(now: DateTime<Utc>) -> (SchedulingService, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(now));
        let service = SchedulingService::new(
            store.clone(),
            store.clone(),
            clock.clone(),
            CancelWindow::from_hours(2.0),
            "agent_001",
            BackendKind::Memory,
        );
        (service, store, clock)
    }

    fn request(key: &str, slot: &str) -> CreateVisitRequest {
        CreateVisitRequest::new(
            ListingId::new("listing-1").unwrap(),
            SlotId::new(slot).unwrap(),
            UserId::new("user-1").unwrap(),
            IdempotencyKey::new(key).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_then_replay() {
        let (service, store, _) = setup(slot_start() - Duration::days(1));

        let first = service.create_visit(&request("abc-1", SLOT)).await.unwrap();
        assert!(!first.is_idempotent());
        assert_eq!(first.visit().status, VisitStatus::Confirmed);
        assert_eq!(first.visit().agent_id, "agent_001");
        assert_eq!(first.slot().status, SlotStatus::Confirmed);

        let second = service.create_visit(&request("abc-1", SLOT)).await.unwrap();
        assert!(second.is_idempotent());
        assert_eq!(second.visit().id, first.visit().id);
        assert_eq!(store.visit_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_slot_is_unavailable() {
        let (service, _, _) = setup(slot_start() - Duration::days(1));
        let err = service
            .create_visit(&request("k", "not-a-slot"))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::SlotUnavailable(_)));
    }

    #[tokio::test]
    async fn test_taken_slot_is_unavailable() {
        let (service, _, _) = setup(slot_start() - Duration::days(1));
        service.create_visit(&request("k1", SLOT)).await.unwrap();
        let err = service.create_visit(&request("k2", SLOT)).await.unwrap_err();
        assert!(matches!(err, SchedulerError::SlotUnavailable(_)));
    }

    #[tokio::test]
    async fn test_contact_saved_normalized() {
        let (service, store, _) = setup(slot_start() - Duration::days(1));
        let req = request("k1", SLOT).with_contact(ContactInfo::new("Ana", "912345678"));
        let outcome = service.create_visit(&req).await.unwrap();

        let contact = store.find_contact(&outcome.visit().id).await.unwrap().unwrap();
        assert_eq!(contact.phone, "+56 9 1234 5678");
    }

    #[tokio::test]
    async fn test_incomplete_contact_skipped() {
        let (service, store, _) = setup(slot_start() - Duration::days(1));
        let req = request("k1", SLOT).with_contact(ContactInfo::new("Ana", ""));
        let outcome = service.create_visit(&req).await.unwrap();
        assert!(store.find_contact(&outcome.visit().id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_releases_slot_and_logs_history() {
        let (service, store, _) = setup(slot_start() - Duration::hours(3));
        let created = service.create_visit(&request("k1", SLOT)).await.unwrap();
        let visit_id = created.visit().id.clone();

        let canceled = service
            .cancel_visit(&CancelVisitRequest::new(visit_id.clone()).with_reason("plans changed"))
            .await
            .unwrap();
        assert_eq!(canceled.status, VisitStatus::Canceled);

        let slot = store.get_slot(&SlotId::new(SLOT).unwrap()).await.unwrap().unwrap();
        assert_eq!(slot.status, SlotStatus::Open);

        let history = store.list_history(&visit_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].event, HistoryEvent::Created);
        assert_eq!(history[1].event, HistoryEvent::StatusChanged);
        assert_eq!(history[1].actor, Actor::user(None));
        assert_eq!(history[1].reason.as_deref(), Some("plans changed"));
    }

    #[tokio::test]
    async fn test_cancel_inside_window_rejected() {
        let (service, _, clock) = setup(slot_start() - Duration::days(1));
        let created = service.create_visit(&request("k1", SLOT)).await.unwrap();

        clock.set(slot_start() - Duration::hours(1));
        let err = service
            .cancel_visit(&CancelVisitRequest::new(created.visit().id.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::CancelWindowExpired { .. }));
    }

    #[tokio::test]
    async fn test_admin_status_change_not_time_gated() {
        let (service, _, clock) = setup(slot_start() - Duration::days(1));
        let created = service.create_visit(&request("k1", SLOT)).await.unwrap();

        clock.set(slot_start() + Duration::hours(1));
        let updated = service
            .update_visit_status(&UpdateVisitStatusRequest::new(
                created.visit().id.clone(),
                VisitStatus::Completed,
            ))
            .await
            .unwrap();
        assert_eq!(updated.status, VisitStatus::Completed);
    }

    #[tokio::test]
    async fn test_reschedule_moves_reservation() {
        let (service, store, _) = setup(slot_start() - Duration::days(1));
        let created = service.create_visit(&request("k1", SLOT)).await.unwrap();
        let next = "mock-slot-2025-01-16-10:00";

        let outcome = service
            .reschedule_visit(&RescheduleVisitRequest::new(
                created.visit().id.clone(),
                SlotId::new(next).unwrap(),
            ))
            .await
            .unwrap();

        assert_eq!(outcome.visit.slot_id.as_str(), next);
        assert_eq!(outcome.previous_slot.status, SlotStatus::Open);
        assert_eq!(outcome.next_slot.status, SlotStatus::Confirmed);

        let history = store.list_history(&outcome.visit.id).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.event, HistoryEvent::Rescheduled);
        assert!(last.metadata.get("previous_slot_start").is_some());
        assert!(last.metadata.get("next_slot_start").is_some());
    }

    #[tokio::test]
    async fn test_bucketing_uses_clock() {
        let (service, _, clock) = setup(slot_start() - Duration::days(1));
        service.create_visit(&request("k1", SLOT)).await.unwrap();
        let user = UserId::new("user-1").unwrap();

        clock.set(slot_start() - Duration::hours(1));
        let visits = service.get_visits_by_user(&user).await.unwrap();
        assert_eq!(visits.upcoming.len(), 1);

        clock.set(slot_start() + Duration::hours(1));
        let visits = service.get_visits_by_user(&user).await.unwrap();
        assert_eq!(visits.past.len(), 1);
        assert!(visits.upcoming.is_empty());
    }
}
