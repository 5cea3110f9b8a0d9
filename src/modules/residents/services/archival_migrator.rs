// Builds the archive batch for a closing period.
//
// For every live resident of the period: take a historical snapshot
// (denormalising the room number and price so the record survives later
// room changes), re-point every payment that references the resident to
// the snapshot, and mark the resident for removal. The batch is applied
// by the store in one transaction; preparation itself writes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::core::Result;
use crate::modules::periods::CalendarYear;
use crate::modules::residents::HistoricalResident;
use crate::store::{ArchiveBatch, LedgerStore, PaymentRepoint, PeriodClose};

pub struct ArchivalMigrator {
    store: Arc<dyn LedgerStore>,
}

impl ArchivalMigrator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Assemble the full close for `year`: the archive batch plus the
    /// expected revenue to freeze onto the year (each occupied room's
    /// price counted once, however many residents share it).
    pub async fn prepare_period_close(
        &self,
        year: &CalendarYear,
        archived_at: DateTime<Utc>,
    ) -> Result<PeriodClose> {
        let residents = self.store.residents_in_period(year.id).await?;

        let mut batch = ArchiveBatch::default();
        let mut occupied_room_prices: HashMap<Uuid, Decimal> = HashMap::new();

        for resident in &residents {
            let room = match resident.room_id {
                Some(room_id) => self.store.find_room_any_state(room_id).await?,
                None => None,
            };
            if let (Some(room_id), Some(room)) = (resident.room_id, room.as_ref()) {
                occupied_room_prices.entry(room_id).or_insert(room.price);
            }

            let snapshot = HistoricalResident::snapshot(resident, room.as_ref(), archived_at);

            // Payments from earlier periods can still reference this
            // resident; all of them move to the snapshot.
            for payment in self.store.payments_for_resident(resident.id).await? {
                batch.payment_repoints.push(PaymentRepoint {
                    payment_id: payment.id,
                    historical_resident_id: snapshot.id,
                });
            }

            batch.retired_resident_ids.push(resident.id);
            batch.snapshots.push(snapshot);
        }

        debug!(
            calendar_year_id = %year.id,
            residents = batch.snapshots.len(),
            payment_repoints = batch.payment_repoints.len(),
            "Prepared archive batch"
        );

        Ok(PeriodClose {
            calendar_year_id: year.id,
            end_date: archived_at,
            expected_revenue_at_close: occupied_room_prices.values().copied().sum(),
            batch,
        })
    }
}
