// Store wrapper that fails the period-close commit on demand, for
// exercising the all-or-nothing guarantee from the service layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use hostelcore::core::{AppError, Result};
use hostelcore::modules::hostels::Hostel;
use hostelcore::modules::payments::Payment;
use hostelcore::modules::periods::CalendarYear;
use hostelcore::modules::residents::{HistoricalResident, Resident};
use hostelcore::modules::rooms::Room;
use hostelcore::store::{LedgerStore, PeriodClose};

/// Delegates every operation to the wrapped store, except that
/// `commit_period_close` fails while the flag is raised.
pub struct FailingStore {
    inner: Arc<dyn LedgerStore>,
    fail_commits: AtomicBool,
}

impl FailingStore {
    pub fn new(inner: Arc<dyn LedgerStore>) -> Self {
        Self {
            inner,
            fail_commits: AtomicBool::new(false),
        }
    }

    pub fn fail_next_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for FailingStore {
    async fn insert_hostel(&self, hostel: &Hostel) -> Result<()> {
        self.inner.insert_hostel(hostel).await
    }

    async fn find_hostel(&self, id: Uuid) -> Result<Option<Hostel>> {
        self.inner.find_hostel(id).await
    }

    async fn insert_calendar_year_if_no_active(&self, year: &CalendarYear) -> Result<bool> {
        self.inner.insert_calendar_year_if_no_active(year).await
    }

    async fn find_calendar_year(&self, id: Uuid) -> Result<Option<CalendarYear>> {
        self.inner.find_calendar_year(id).await
    }

    async fn find_active_calendar_year(&self, hostel_id: Uuid) -> Result<Option<CalendarYear>> {
        self.inner.find_active_calendar_year(hostel_id).await
    }

    async fn list_calendar_years(&self, hostel_id: Uuid) -> Result<Vec<CalendarYear>> {
        self.inner.list_calendar_years(hostel_id).await
    }

    async fn update_calendar_year_name(
        &self,
        id: Uuid,
        name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.inner
            .update_calendar_year_name(id, name, updated_at)
            .await
    }

    async fn delete_calendar_year(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_calendar_year(id).await
    }

    async fn commit_period_close(&self, close: &PeriodClose) -> Result<CalendarYear> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(AppError::internal("injected store failure"));
        }
        self.inner.commit_period_close(close).await
    }

    async fn insert_resident(&self, resident: &Resident) -> Result<()> {
        self.inner.insert_resident(resident).await
    }

    async fn residents_in_period(&self, calendar_year_id: Uuid) -> Result<Vec<Resident>> {
        self.inner.residents_in_period(calendar_year_id).await
    }

    async fn count_residents_in_period(&self, calendar_year_id: Uuid) -> Result<u64> {
        self.inner.count_residents_in_period(calendar_year_id).await
    }

    async fn historical_residents_in_period(
        &self,
        calendar_year_id: Uuid,
    ) -> Result<Vec<HistoricalResident>> {
        self.inner
            .historical_residents_in_period(calendar_year_id)
            .await
    }

    async fn count_historical_residents_in_period(&self, calendar_year_id: Uuid) -> Result<u64> {
        self.inner
            .count_historical_residents_in_period(calendar_year_id)
            .await
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<()> {
        self.inner.insert_payment(payment).await
    }

    async fn payments_in_period(&self, calendar_year_id: Uuid) -> Result<Vec<Payment>> {
        self.inner.payments_in_period(calendar_year_id).await
    }

    async fn count_payments_in_period(&self, calendar_year_id: Uuid) -> Result<u64> {
        self.inner.count_payments_in_period(calendar_year_id).await
    }

    async fn payments_for_resident(&self, resident_id: Uuid) -> Result<Vec<Payment>> {
        self.inner.payments_for_resident(resident_id).await
    }

    async fn insert_room(&self, room: &Room) -> Result<()> {
        self.inner.insert_room(room).await
    }

    async fn rooms_in_hostel(&self, hostel_id: Uuid) -> Result<Vec<Room>> {
        self.inner.rooms_in_hostel(hostel_id).await
    }

    async fn find_room_any_state(&self, id: Uuid) -> Result<Option<Room>> {
        self.inner.find_room_any_state(id).await
    }
}
