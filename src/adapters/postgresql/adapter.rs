//! PostgreSQL adapter implementing the store traits
//!
//! Slot reservation is a single conditional `UPDATE ... WHERE status = 'open'`
//! so the database arbitrates concurrent bookings. Visit inserts rely on the
//! unique index over `idempotency_key`.

use crate::adapters::database::traits::{InsertOutcome, SlotStore, VisitStore};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    contact_from_row, history_from_row, slot_from_row, visit_from_row, CONTACT_COLUMNS,
    HISTORY_COLUMNS, SLOT_COLUMNS, VISIT_COLUMNS,
};
use crate::domain::{
    ContactInfo, IdempotencyKey, ListingId, Result, SchedulerError, Slot, SlotId, UserId, Visit,
    VisitHistoryEntry, VisitId, VisitStatus,
};
use async_trait::async_trait;
use std::sync::Arc;

/// PostgreSQL implementation of [`SlotStore`] and [`VisitStore`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl SlotStore for PostgreSQLAdapter {
    async fn get_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM visit_slots WHERE id = $1");
        self.client
            .query_opt(&query, &[&slot_id.as_str()])
            .await?
            .map(|row| slot_from_row(&row))
            .transpose()
    }

    async fn reserve_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>> {
        let query = format!(
            "UPDATE visit_slots SET status = 'confirmed', updated_at = NOW() \
             WHERE id = $1 AND status = 'open' \
             RETURNING {SLOT_COLUMNS}"
        );
        let reserved = self
            .client
            .query_opt(&query, &[&slot_id.as_str()])
            .await?
            .map(|row| slot_from_row(&row))
            .transpose()?;

        if reserved.is_none() {
            tracing::debug!(slot_id = %slot_id, "Slot not open for reservation");
        }
        Ok(reserved)
    }

    async fn release_slot(&self, slot_id: &SlotId) -> Result<()> {
        let released = self
            .client
            .execute(
                "UPDATE visit_slots SET status = 'open', updated_at = NOW() \
                 WHERE id = $1 AND status = 'confirmed'",
                &[&slot_id.as_str()],
            )
            .await?;

        tracing::debug!(slot_id = %slot_id, released, "Slot release");
        Ok(())
    }

    async fn insert_slot_if_absent(&self, slot: Slot) -> Result<Slot> {
        self.client
            .execute(
                "INSERT INTO visit_slots (id, listing_id, start_time, end_time, status, source, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 ON CONFLICT (id) DO NOTHING",
                &[
                    &slot.id.as_str(),
                    &slot.listing_id.as_str(),
                    &slot.start_time,
                    &slot.end_time,
                    &slot.status.as_str(),
                    &slot.source.as_str(),
                    &slot.created_at,
                ],
            )
            .await?;

        self.get_slot(&slot.id).await?.ok_or_else(|| {
            SchedulerError::Database(format!("Slot {} missing after insert", slot.id))
        })
    }
}

#[async_trait]
impl VisitStore for PostgreSQLAdapter {
    async fn find_by_idempotency_key(&self, key: &IdempotencyKey) -> Result<Option<Visit>> {
        let query = format!("SELECT {VISIT_COLUMNS} FROM visits WHERE idempotency_key = $1");
        self.client
            .query_opt(&query, &[&key.as_str()])
            .await?
            .map(|row| visit_from_row(&row))
            .transpose()
    }

    async fn find_by_id(&self, visit_id: &VisitId) -> Result<Option<Visit>> {
        let query = format!("SELECT {VISIT_COLUMNS} FROM visits WHERE id = $1");
        self.client
            .query_opt(&query, &[&visit_id.as_str()])
            .await?
            .map(|row| visit_from_row(&row))
            .transpose()
    }

    async fn insert_visit(&self, visit: Visit) -> Result<InsertOutcome> {
        let query = format!(
            "INSERT INTO visits ({VISIT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (idempotency_key) DO NOTHING \
             RETURNING {VISIT_COLUMNS}"
        );
        let row = self
            .client
            .query_opt(
                &query,
                &[
                    &visit.id.as_str(),
                    &visit.listing_id.as_str(),
                    &visit.slot_id.as_str(),
                    &visit.user_id.as_str(),
                    &visit.status.as_str(),
                    &visit.idempotency_key.as_str(),
                    &visit.agent_id,
                    &visit.channel.as_str(),
                    &visit.created_at,
                ],
            )
            .await?;

        match row {
            Some(row) => Ok(InsertOutcome::Inserted(visit_from_row(&row)?)),
            None => Ok(InsertOutcome::DuplicateKey),
        }
    }

    async fn update_status(&self, visit_id: &VisitId, status: VisitStatus) -> Result<Visit> {
        let query = format!(
            "UPDATE visits SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {VISIT_COLUMNS}"
        );
        let row = self
            .client
            .query_opt(&query, &[&visit_id.as_str(), &status.as_str()])
            .await?
            .ok_or_else(|| SchedulerError::VisitNotFound(visit_id.to_string()))?;
        visit_from_row(&row)
    }

    async fn update_slot_and_status(
        &self,
        visit_id: &VisitId,
        slot_id: &SlotId,
        listing_id: Option<&ListingId>,
        status: VisitStatus,
    ) -> Result<Visit> {
        let query = format!(
            "UPDATE visits SET slot_id = $2, listing_id = COALESCE($3, listing_id), \
             status = $4, updated_at = NOW() WHERE id = $1 \
             RETURNING {VISIT_COLUMNS}"
        );
        let listing: Option<&str> = listing_id.map(ListingId::as_str);
        let row = self
            .client
            .query_opt(
                &query,
                &[
                    &visit_id.as_str(),
                    &slot_id.as_str(),
                    &listing,
                    &status.as_str(),
                ],
            )
            .await?
            .ok_or_else(|| SchedulerError::VisitNotFound(visit_id.to_string()))?;
        visit_from_row(&row)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Visit>> {
        let query = format!(
            "SELECT {VISIT_COLUMNS} FROM visits WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = self.client.query(&query, &[&user_id.as_str()]).await?;
        rows.iter().map(visit_from_row).collect()
    }

    async fn append_history(&self, entry: VisitHistoryEntry) -> Result<()> {
        let query = format!(
            "INSERT INTO visit_status_history ({HISTORY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        );
        let from_status = entry.from_status.map(|s| s.as_str());
        let to_status = entry.to_status.map(|s| s.as_str());
        let from_slot = entry.from_slot_id.as_ref().map(SlotId::as_str);
        let to_slot = entry.to_slot_id.as_ref().map(SlotId::as_str);

        self.client
            .execute(
                &query,
                &[
                    &entry.visit_id.as_str(),
                    &entry.event.as_str(),
                    &from_status,
                    &to_status,
                    &from_slot,
                    &to_slot,
                    &entry.reason,
                    &entry.actor.kind.as_str(),
                    &entry.actor.id,
                    &entry.metadata,
                    &entry.created_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn list_history(&self, visit_id: &VisitId) -> Result<Vec<VisitHistoryEntry>> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM visit_status_history WHERE visit_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = self.client.query(&query, &[&visit_id.as_str()]).await?;
        rows.iter().map(history_from_row).collect()
    }

    async fn save_contact(&self, visit_id: &VisitId, contact: &ContactInfo) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO visit_contacts (visit_id, name, phone, email, rut) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (visit_id) DO UPDATE SET \
                     name = EXCLUDED.name, \
                     phone = EXCLUDED.phone, \
                     email = EXCLUDED.email, \
                     rut = EXCLUDED.rut, \
                     updated_at = NOW()",
                &[
                    &visit_id.as_str(),
                    &contact.name,
                    &contact.phone,
                    &contact.email,
                    &contact.rut,
                ],
            )
            .await?;
        Ok(())
    }

    async fn find_contact(&self, visit_id: &VisitId) -> Result<Option<ContactInfo>> {
        let query = format!("SELECT {CONTACT_COLUMNS} FROM visit_contacts WHERE visit_id = $1");
        self.client
            .query_opt(&query, &[&visit_id.as_str()])
            .await?
            .map(|row| contact_from_row(&row))
            .transpose()
    }
}
