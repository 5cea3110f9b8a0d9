use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::periods::CalendarYear;
use crate::modules::residents::ArchivalMigrator;
use crate::store::LedgerStore;

/// Period manager: owns the calendar-year lifecycle of every hostel.
///
/// Guards the one-active-period-per-hostel invariant on start and
/// orchestrates the close transition, where the period flip and the
/// wholesale archival of its residents commit as a single store
/// transaction. Room release on close is deliberately not handled here;
/// rooms belong to the surrounding dashboard.
pub struct PeriodService {
    store: Arc<dyn LedgerStore>,
    migrator: ArchivalMigrator,
}

impl PeriodService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        let migrator = ArchivalMigrator::new(store.clone());
        Self { store, migrator }
    }

    /// Open a new active period for a hostel.
    ///
    /// Fails with `Validation` on a blank name, `NotFound` on an unknown
    /// hostel and `Conflict` when the hostel already has an active period.
    /// The check-and-insert is atomic in the store, so concurrent starts
    /// for the same hostel cannot both succeed.
    pub async fn start_period(&self, hostel_id: Uuid, name: &str) -> Result<CalendarYear> {
        let year = CalendarYear::open(hostel_id, name, Utc::now())?;

        self.store
            .find_hostel(hostel_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Hostel '{}' not found", hostel_id)))?;

        let inserted = self.store.insert_calendar_year_if_no_active(&year).await?;
        if !inserted {
            warn!(hostel_id = %hostel_id, "Rejected period start: hostel already has an active period");
            return Err(AppError::conflict(
                "Hostel already has an active calendar year",
            ));
        }

        info!(
            hostel_id = %hostel_id,
            calendar_year_id = %year.id,
            name = %year.name,
            "Started new calendar year"
        );
        Ok(year)
    }

    /// Close a period: set its end date, freeze the expected revenue and
    /// archive every resident with their payments re-pointed, all in one
    /// store transaction. A failure anywhere rolls the whole transition
    /// back and the period stays active.
    ///
    /// Closing an already-ended period is a `Conflict`, never a silent
    /// no-op; a retried close that actually committed must surface the
    /// mistake to the caller instead of masking it.
    pub async fn end_period(&self, calendar_year_id: Uuid) -> Result<CalendarYear> {
        let year = self
            .store
            .find_calendar_year(calendar_year_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Calendar year '{}' not found", calendar_year_id))
            })?;
        if year.is_ended() {
            warn!(calendar_year_id = %calendar_year_id, "Rejected close: calendar year already ended");
            return Err(AppError::conflict("Calendar year is already ended"));
        }

        let close = self.migrator.prepare_period_close(&year, Utc::now()).await?;
        let migrated = close.batch.migrated_count();
        let repointed = close.batch.payment_repoints.len();

        let closed = self.store.commit_period_close(&close).await?;

        info!(
            calendar_year_id = %closed.id,
            hostel_id = %closed.hostel_id,
            residents_archived = migrated,
            payments_repointed = repointed,
            expected_revenue = %close.expected_revenue_at_close,
            "Closed calendar year"
        );
        Ok(closed)
    }

    /// Rename a period. Allowed whether active or ended; the rename never
    /// touches `start_date`, `end_date` or `is_active` since those are
    /// derived facts, and edit attempts are rejected at the request boundary.
    pub async fn rename_period(
        &self,
        calendar_year_id: Uuid,
        new_name: &str,
    ) -> Result<CalendarYear> {
        let name = CalendarYear::validate_name(new_name)?;

        let updated = self
            .store
            .update_calendar_year_name(calendar_year_id, &name, Utc::now())
            .await?;
        if !updated {
            return Err(AppError::not_found(format!(
                "Calendar year '{}' not found",
                calendar_year_id
            )));
        }

        self.store
            .find_calendar_year(calendar_year_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Calendar year '{}' not found", calendar_year_id))
            })
    }

    /// Delete a period that has no financial history.
    ///
    /// The dependent pre-check (live residents, historical residents,
    /// payments) is enforced here, not by a database cascade: deleting a
    /// period that still has history is a `Conflict` so the audit trail
    /// can never vanish through this path.
    pub async fn delete_period(&self, calendar_year_id: Uuid, hostel_id: Uuid) -> Result<()> {
        let year = self
            .store
            .find_calendar_year(calendar_year_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Calendar year '{}' not found", calendar_year_id))
            })?;
        if year.hostel_id != hostel_id {
            // The period exists but not under this hostel; from the
            // caller's perspective that period is not there.
            return Err(AppError::not_found(format!(
                "Calendar year '{}' not found for hostel '{}'",
                calendar_year_id, hostel_id
            )));
        }

        let residents = self.store.count_residents_in_period(calendar_year_id).await?;
        let historical = self
            .store
            .count_historical_residents_in_period(calendar_year_id)
            .await?;
        let payments = self.store.count_payments_in_period(calendar_year_id).await?;
        if residents > 0 || historical > 0 || payments > 0 {
            warn!(
                calendar_year_id = %calendar_year_id,
                residents,
                historical,
                payments,
                "Rejected period delete: dependents present"
            );
            return Err(AppError::conflict(format!(
                "Calendar year has dependents ({} residents, {} historical residents, {} payments)",
                residents, historical, payments
            )));
        }

        let deleted = self.store.delete_calendar_year(calendar_year_id).await?;
        if !deleted {
            return Err(AppError::not_found(format!(
                "Calendar year '{}' not found",
                calendar_year_id
            )));
        }

        info!(calendar_year_id = %calendar_year_id, hostel_id = %hostel_id, "Deleted calendar year");
        Ok(())
    }

    /// All periods of a hostel ordered by start date, oldest first.
    pub async fn list_periods(&self, hostel_id: Uuid) -> Result<Vec<CalendarYear>> {
        self.store
            .find_hostel(hostel_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Hostel '{}' not found", hostel_id)))?;

        self.store.list_calendar_years(hostel_id).await
    }
}
