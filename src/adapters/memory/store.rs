//! In-memory store
//!
//! Every map lives behind one async mutex, so each trait method is a single
//! critical section. That makes `reserve_slot` a compare-and-swap on the slot
//! status and `insert_visit` a check-and-insert on the idempotency index.

use crate::adapters::database::traits::{InsertOutcome, SlotStore, VisitStore};
use crate::domain::{
    ContactInfo, IdempotencyKey, ListingId, Result, SchedulerError, Slot, SlotId, SlotStatus,
    UserId, Visit, VisitHistoryEntry, VisitId, VisitStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug)]
struct StoredVisit {
    visit: Visit,
    seq: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    slots: HashMap<SlotId, Slot>,
    visits: HashMap<VisitId, StoredVisit>,
    idempotency: HashMap<IdempotencyKey, VisitId>,
    history: Vec<VisitHistoryEntry>,
    contacts: HashMap<VisitId, ContactInfo>,
    next_seq: u64,
}

impl MemoryState {
    fn visit_mut(&mut self, visit_id: &VisitId) -> Result<&mut Visit> {
        self.visits
            .get_mut(visit_id)
            .map(|stored| &mut stored.visit)
            .ok_or_else(|| SchedulerError::VisitNotFound(visit_id.to_string()))
    }
}

/// Process-local scheduling store
///
/// Construct one per process (or per test); nothing is shared between instances.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots currently held by a visit
    pub async fn confirmed_slot_count(&self) -> usize {
        let state = self.state.lock().await;
        state
            .slots
            .values()
            .filter(|slot| slot.status == SlotStatus::Confirmed)
            .count()
    }

    pub async fn visit_count(&self) -> usize {
        self.state.lock().await.visits.len()
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn get_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        Ok(self.state.lock().await.slots.get(slot_id).cloned())
    }

    async fn reserve_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        let mut state = self.state.lock().await;
        match state.slots.get_mut(slot_id) {
            Some(slot) if slot.status == SlotStatus::Open => {
                slot.status = SlotStatus::Confirmed;
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_slot(&self, slot_id: &SlotId) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(slot) = state.slots.get_mut(slot_id) {
            if slot.status == SlotStatus::Confirmed {
                slot.status = SlotStatus::Open;
            }
        }
        Ok(())
    }

    async fn insert_slot_if_absent(&self, slot: Slot) -> Result<Slot> {
        let mut state = self.state.lock().await;
        Ok(state.slots.entry(slot.id.clone()).or_insert(slot).clone())
    }
}

#[async_trait]
impl VisitStore for MemoryStore {
    async fn find_by_idempotency_key(&self, key: &IdempotencyKey) -> Result<Option<Visit>> {
        let state = self.state.lock().await;
        Ok(state
            .idempotency
            .get(key)
            .and_then(|id| state.visits.get(id))
            .map(|stored| stored.visit.clone()))
    }

    async fn find_by_id(&self, visit_id: &VisitId) -> Result<Option<Visit>> {
        let state = self.state.lock().await;
        Ok(state.visits.get(visit_id).map(|stored| stored.visit.clone()))
    }

    async fn insert_visit(&self, visit: Visit) -> Result<InsertOutcome> {
        let mut state = self.state.lock().await;
        if state.idempotency.contains_key(&visit.idempotency_key) {
            return Ok(InsertOutcome::DuplicateKey);
        }
        if state.visits.contains_key(&visit.id) {
            return Err(SchedulerError::Database(format!(
                "Visit {} already exists",
                visit.id
            )));
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state
            .idempotency
            .insert(visit.idempotency_key.clone(), visit.id.clone());
        state.visits.insert(
            visit.id.clone(),
            StoredVisit {
                visit: visit.clone(),
                seq,
            },
        );
        Ok(InsertOutcome::Inserted(visit))
    }

    async fn update_status(&self, visit_id: &VisitId, status: VisitStatus) -> Result<Visit> {
        let mut state = self.state.lock().await;
        let visit = state.visit_mut(visit_id)?;
        visit.status = status;
        Ok(visit.clone())
    }

    async fn update_slot_and_status(
        &self,
        visit_id: &VisitId,
        slot_id: &SlotId,
        listing_id: Option<&ListingId>,
        status: VisitStatus,
    ) -> Result<Visit> {
        let mut state = self.state.lock().await;
        let visit = state.visit_mut(visit_id)?;
        visit.slot_id = slot_id.clone();
        if let Some(listing_id) = listing_id {
            visit.listing_id = listing_id.clone();
        }
        visit.status = status;
        Ok(visit.clone())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Visit>> {
        let state = self.state.lock().await;
        let mut stored: Vec<&StoredVisit> = state
            .visits
            .values()
            .filter(|stored| &stored.visit.user_id == user_id)
            .collect();
        stored.sort_by(|a, b| {
            b.visit
                .created_at
                .cmp(&a.visit.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(stored.into_iter().map(|s| s.visit.clone()).collect())
    }

    async fn append_history(&self, entry: VisitHistoryEntry) -> Result<()> {
        self.state.lock().await.history.push(entry);
        Ok(())
    }

    async fn list_history(&self, visit_id: &VisitId) -> Result<Vec<VisitHistoryEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .history
            .iter()
            .filter(|entry| &entry.visit_id == visit_id)
            .cloned()
            .collect())
    }

    async fn save_contact(&self, visit_id: &VisitId, contact: &ContactInfo) -> Result<()> {
        let mut state = self.state.lock().await;
        state.contacts.insert(visit_id.clone(), contact.clone());
        Ok(())
    }

    async fn find_contact(&self, visit_id: &VisitId) -> Result<Option<ContactInfo>> {
        Ok(self.state.lock().await.contacts.get(visit_id).cloned())
    }
}
