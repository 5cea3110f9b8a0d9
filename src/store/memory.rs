// In-memory ledger store backed by hash maps under a single RwLock.
//
// Used by the test suite and by local development without a database.
// All mutating operations take the write lock for their full duration,
// so the one-active-period check and the period-close commit are atomic
// against concurrent callers exactly like their SQL counterparts.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::{AppError, RecordState, Result};
use crate::modules::hostels::Hostel;
use crate::modules::payments::Payment;
use crate::modules::periods::CalendarYear;
use crate::modules::residents::{HistoricalResident, Resident};
use crate::modules::rooms::Room;

use super::{LedgerStore, PeriodClose};

#[derive(Debug, Default)]
struct Tables {
    hostels: HashMap<Uuid, Hostel>,
    calendar_years: HashMap<Uuid, CalendarYear>,
    residents: HashMap<Uuid, Resident>,
    historical_residents: HashMap<Uuid, HistoricalResident>,
    payments: HashMap<Uuid, Payment>,
    rooms: HashMap<Uuid, Room>,
}

#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_hostel(&self, hostel: &Hostel) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.hostels.insert(hostel.id, hostel.clone());
        Ok(())
    }

    async fn find_hostel(&self, id: Uuid) -> Result<Option<Hostel>> {
        let tables = self.tables.read().await;
        Ok(tables
            .hostels
            .get(&id)
            .filter(|h| h.state.is_active())
            .cloned())
    }

    async fn insert_calendar_year_if_no_active(&self, year: &CalendarYear) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let already_active = tables
            .calendar_years
            .values()
            .any(|y| y.hostel_id == year.hostel_id && y.is_active);
        if already_active {
            return Ok(false);
        }
        tables.calendar_years.insert(year.id, year.clone());
        Ok(true)
    }

    async fn find_calendar_year(&self, id: Uuid) -> Result<Option<CalendarYear>> {
        let tables = self.tables.read().await;
        Ok(tables.calendar_years.get(&id).cloned())
    }

    async fn find_active_calendar_year(&self, hostel_id: Uuid) -> Result<Option<CalendarYear>> {
        let tables = self.tables.read().await;
        Ok(tables
            .calendar_years
            .values()
            .find(|y| y.hostel_id == hostel_id && y.is_active)
            .cloned())
    }

    async fn list_calendar_years(&self, hostel_id: Uuid) -> Result<Vec<CalendarYear>> {
        let tables = self.tables.read().await;
        let mut years: Vec<CalendarYear> = tables
            .calendar_years
            .values()
            .filter(|y| y.hostel_id == hostel_id)
            .cloned()
            .collect();
        years.sort_by_key(|y| y.start_date);
        Ok(years)
    }

    async fn update_calendar_year_name(
        &self,
        id: Uuid,
        name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.calendar_years.get_mut(&id) {
            Some(year) => {
                year.name = name.to_string();
                year.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_calendar_year(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;

        // Backstop behind the service pre-check, standing in for the
        // RESTRICT foreign keys of the SQL schema.
        let has_dependents = tables
            .residents
            .values()
            .any(|r| r.calendar_year_id == id)
            || tables
                .historical_residents
                .values()
                .any(|h| h.calendar_year_id == id)
            || tables.payments.values().any(|p| p.calendar_year_id == id);
        if has_dependents {
            return Err(AppError::conflict(
                "Calendar year still has dependent records",
            ));
        }

        Ok(tables.calendar_years.remove(&id).is_some())
    }

    async fn commit_period_close(&self, close: &PeriodClose) -> Result<CalendarYear> {
        let mut tables = self.tables.write().await;

        // Validate the whole batch before touching anything, so a failed
        // commit leaves the tables exactly as they were.
        let year = tables
            .calendar_years
            .get(&close.calendar_year_id)
            .ok_or_else(|| AppError::not_found("Calendar year not found"))?;
        if !year.is_active {
            return Err(AppError::conflict("Calendar year is already ended"));
        }

        let stragglers = tables
            .residents
            .values()
            .filter(|r| r.calendar_year_id == close.calendar_year_id)
            .filter(|r| !close.batch.retired_resident_ids.contains(&r.id))
            .count();
        if stragglers > 0 {
            return Err(AppError::conflict(format!(
                "{} resident(s) joined the period during close; retry",
                stragglers
            )));
        }

        // A payment recorded against a retired resident after the batch
        // was prepared has no covering re-point and would dangle once the
        // resident is removed.
        let retired = &close.batch.retired_resident_ids;
        let uncovered = tables
            .payments
            .values()
            .filter(|p| matches!(p.resident_id, Some(rid) if retired.contains(&rid)))
            .filter(|p| {
                !close
                    .batch
                    .payment_repoints
                    .iter()
                    .any(|r| r.payment_id == p.id)
            })
            .count();
        if uncovered > 0 {
            return Err(AppError::conflict(format!(
                "{} payment(s) were recorded during close; retry",
                uncovered
            )));
        }

        for repoint in &close.batch.payment_repoints {
            if !tables.payments.contains_key(&repoint.payment_id) {
                return Err(AppError::conflict(
                    "Archive batch references a payment that no longer exists",
                ));
            }
        }

        let year = tables
            .calendar_years
            .get_mut(&close.calendar_year_id)
            .ok_or_else(|| AppError::not_found("Calendar year not found"))?;
        year.is_active = false;
        year.end_date = Some(close.end_date);
        year.expected_revenue_at_close = Some(close.expected_revenue_at_close);
        year.updated_at = close.end_date;
        let closed = year.clone();

        for snapshot in &close.batch.snapshots {
            tables
                .historical_residents
                .insert(snapshot.id, snapshot.clone());
        }
        for repoint in &close.batch.payment_repoints {
            if let Some(payment) = tables.payments.get_mut(&repoint.payment_id) {
                payment.resident_id = None;
                payment.historical_resident_id = Some(repoint.historical_resident_id);
                payment.updated_at = close.end_date;
            }
        }
        for resident_id in &close.batch.retired_resident_ids {
            tables.residents.remove(resident_id);
        }

        Ok(closed)
    }

    async fn insert_resident(&self, resident: &Resident) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.residents.insert(resident.id, resident.clone());
        Ok(())
    }

    async fn residents_in_period(&self, calendar_year_id: Uuid) -> Result<Vec<Resident>> {
        let tables = self.tables.read().await;
        let mut residents: Vec<Resident> = tables
            .residents
            .values()
            .filter(|r| r.calendar_year_id == calendar_year_id)
            .cloned()
            .collect();
        residents.sort_by_key(|r| r.id);
        Ok(residents)
    }

    async fn count_residents_in_period(&self, calendar_year_id: Uuid) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .residents
            .values()
            .filter(|r| r.calendar_year_id == calendar_year_id)
            .count() as u64)
    }

    async fn historical_residents_in_period(
        &self,
        calendar_year_id: Uuid,
    ) -> Result<Vec<HistoricalResident>> {
        let tables = self.tables.read().await;
        let mut snapshots: Vec<HistoricalResident> = tables
            .historical_residents
            .values()
            .filter(|h| h.calendar_year_id == calendar_year_id)
            .cloned()
            .collect();
        snapshots.sort_by_key(|h| h.id);
        Ok(snapshots)
    }

    async fn count_historical_residents_in_period(&self, calendar_year_id: Uuid) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .historical_residents
            .values()
            .filter(|h| h.calendar_year_id == calendar_year_id)
            .count() as u64)
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn payments_in_period(&self, calendar_year_id: Uuid) -> Result<Vec<Payment>> {
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.calendar_year_id == calendar_year_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.date, p.id));
        Ok(payments)
    }

    async fn count_payments_in_period(&self, calendar_year_id: Uuid) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| p.calendar_year_id == calendar_year_id)
            .count() as u64)
    }

    async fn payments_for_resident(&self, resident_id: Uuid) -> Result<Vec<Payment>> {
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.resident_id == Some(resident_id))
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.date, p.id));
        Ok(payments)
    }

    async fn insert_room(&self, room: &Room) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn rooms_in_hostel(&self, hostel_id: Uuid) -> Result<Vec<Room>> {
        let tables = self.tables.read().await;
        let mut rooms: Vec<Room> = tables
            .rooms
            .values()
            .filter(|r| r.hostel_id == hostel_id && r.state == RecordState::Active)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(rooms)
    }

    async fn find_room_any_state(&self, id: Uuid) -> Result<Option<Room>> {
        let tables = self.tables.read().await;
        Ok(tables.rooms.get(&id).cloned())
    }
}
