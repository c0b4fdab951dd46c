//! Degraded-mode delegation
//!
//! When the durable store reports that its tables do not exist, development
//! and staging processes keep working on an in-memory delegate. The whole call
//! is re-run on the delegate; no state is mixed between the two backends
//! within one call. Production never degrades.

use crate::config::Environment;
use crate::core::scheduling::{
    BackendKind, CancelVisitRequest, CreateVisitOutcome, CreateVisitRequest, RescheduleOutcome,
    RescheduleVisitRequest, UpdateVisitStatusRequest, UserVisits, VisitScheduler,
};
use crate::domain::{Result, SchedulerError, Slot, SlotId, UserId, Visit, VisitHistoryEntry, VisitId};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable scheduler with an in-memory delegate for a missing schema
pub struct DegradingScheduler {
    primary: Arc<dyn VisitScheduler>,
    fallback: Arc<dyn VisitScheduler>,
    environment: Environment,
}

impl DegradingScheduler {
    pub fn new(
        primary: Arc<dyn VisitScheduler>,
        fallback: Arc<dyn VisitScheduler>,
        environment: Environment,
    ) -> Self {
        Self {
            primary,
            fallback,
            environment,
        }
    }

    fn should_degrade(&self, operation: &str, error: &SchedulerError) -> bool {
        if !error.is_missing_schema() || self.environment.is_production() {
            return false;
        }
        tracing::warn!(
            operation,
            error = %error,
            environment = %self.environment,
            "Durable schema missing, falling back to in-memory store"
        );
        true
    }
}

#[async_trait]
impl VisitScheduler for DegradingScheduler {
    fn backend(&self) -> BackendKind {
        self.primary.backend()
    }

    async fn create_visit(&self, request: &CreateVisitRequest) -> Result<CreateVisitOutcome> {
        match self.primary.create_visit(request).await {
            Err(e) if self.should_degrade("create_visit", &e) => {
                self.fallback.create_visit(request).await
            }
            other => other,
        }
    }

    async fn cancel_visit(&self, request: &CancelVisitRequest) -> Result<Visit> {
        match self.primary.cancel_visit(request).await {
            Err(e) if self.should_degrade("cancel_visit", &e) => {
                self.fallback.cancel_visit(request).await
            }
            other => other,
        }
    }

    async fn update_visit_status(&self, request: &UpdateVisitStatusRequest) -> Result<Visit> {
        match self.primary.update_visit_status(request).await {
            Err(e) if self.should_degrade("update_visit_status", &e) => {
                self.fallback.update_visit_status(request).await
            }
            other => other,
        }
    }

    async fn reschedule_visit(
        &self,
        request: &RescheduleVisitRequest,
    ) -> Result<RescheduleOutcome> {
        match self.primary.reschedule_visit(request).await {
            Err(e) if self.should_degrade("reschedule_visit", &e) => {
                self.fallback.reschedule_visit(request).await
            }
            other => other,
        }
    }

    async fn get_visits_by_user(&self, user_id: &UserId) -> Result<UserVisits> {
        match self.primary.get_visits_by_user(user_id).await {
            Err(e) if self.should_degrade("get_visits_by_user", &e) => {
                self.fallback.get_visits_by_user(user_id).await
            }
            other => other,
        }
    }

    async fn get_visit(&self, visit_id: &VisitId) -> Result<Option<Visit>> {
        match self.primary.get_visit(visit_id).await {
            Err(e) if self.should_degrade("get_visit", &e) => self.fallback.get_visit(visit_id).await,
            other => other,
        }
    }

    async fn visit_history(&self, visit_id: &VisitId) -> Result<Vec<VisitHistoryEntry>> {
        match self.primary.visit_history(visit_id).await {
            Err(e) if self.should_degrade("visit_history", &e) => {
                self.fallback.visit_history(visit_id).await
            }
            other => other,
        }
    }

    async fn get_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        match self.primary.get_slot(slot_id).await {
            Err(e) if self.should_degrade("get_slot", &e) => self.fallback.get_slot(slot_id).await,
            other => other,
        }
    }

    async fn publish_slot(&self, slot: Slot) -> Result<Slot> {
        match self.primary.publish_slot(slot.clone()).await {
            Err(e) if self.should_degrade("publish_slot", &e) => {
                self.fallback.publish_slot(slot).await
            }
            other => other,
        }
    }
}
