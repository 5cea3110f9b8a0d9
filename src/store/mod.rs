// Ledger store: the persistence seam for the period/ledger core.
//
// The core never talks to a database directly; every operation goes through
// the `LedgerStore` trait. Two implementations ship: `MySqlLedgerStore` for
// production and `InMemoryLedgerStore` for tests and local development.
// The only multi-row write the core requires is the period-close commit,
// which implementations must apply all-or-nothing.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::Result;
use crate::modules::hostels::Hostel;
use crate::modules::payments::Payment;
use crate::modules::periods::CalendarYear;
use crate::modules::residents::{HistoricalResident, Resident};
use crate::modules::rooms::Room;

pub use memory::InMemoryLedgerStore;
pub use mysql::MySqlLedgerStore;

/// One payment re-pointed from a live resident to its historical snapshot.
#[derive(Debug, Clone)]
pub struct PaymentRepoint {
    pub payment_id: Uuid,
    pub historical_resident_id: Uuid,
}

/// Everything the archival migrator produces for one closing period.
///
/// Applied as a unit: snapshots inserted, payments re-pointed, live
/// residents removed. A batch is internally consistent by construction:
/// every re-point targets a snapshot in `snapshots`, every retired id has
/// a snapshot taken from it.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBatch {
    pub snapshots: Vec<HistoricalResident>,
    pub payment_repoints: Vec<PaymentRepoint>,
    pub retired_resident_ids: Vec<Uuid>,
}

impl ArchiveBatch {
    /// Number of residents this batch migrates.
    pub fn migrated_count(&self) -> usize {
        self.snapshots.len()
    }
}

/// The full state transition for ending a period, committed in one
/// store transaction.
#[derive(Debug, Clone)]
pub struct PeriodClose {
    pub calendar_year_id: Uuid,
    pub end_date: DateTime<Utc>,
    /// Sum of occupied-room prices at close, frozen onto the year
    pub expected_revenue_at_close: Decimal,
    pub batch: ArchiveBatch,
}

/// Typed read/write operations over the relational ledger.
///
/// Read paths name the record states they include: hostel and room lookups
/// return `Active` rows unless the method says otherwise. Residents and
/// payments have no tombstones in this core; residents leave the live set
/// only through archival, and payments are append-only once their period
/// ends.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // --- hostels ---

    async fn insert_hostel(&self, hostel: &Hostel) -> Result<()>;

    /// Active hostels only.
    async fn find_hostel(&self, id: Uuid) -> Result<Option<Hostel>>;

    // --- calendar years ---

    /// Insert a new active year for its hostel, atomically with the check
    /// that no other active year exists for that hostel. Returns `false`
    /// (nothing inserted) when an active year was already present.
    async fn insert_calendar_year_if_no_active(&self, year: &CalendarYear) -> Result<bool>;

    async fn find_calendar_year(&self, id: Uuid) -> Result<Option<CalendarYear>>;

    async fn find_active_calendar_year(&self, hostel_id: Uuid) -> Result<Option<CalendarYear>>;

    /// All years of a hostel, ordered by `start_date` ascending.
    async fn list_calendar_years(&self, hostel_id: Uuid) -> Result<Vec<CalendarYear>>;

    /// Rename a year. Returns `false` when the year does not exist.
    async fn update_calendar_year_name(
        &self,
        id: Uuid,
        name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Physically delete a year. Callers run the no-dependents pre-check;
    /// this is not a cascade, and a dependent row that slipped in after
    /// the pre-check fails the delete with `Conflict`. Returns `false`
    /// when the year does not exist.
    async fn delete_calendar_year(&self, id: Uuid) -> Result<bool>;

    /// Atomically end a period: flip it inactive with its end date and
    /// frozen expected revenue, insert the historical snapshots, re-point
    /// the payments and remove the retired residents, all or nothing.
    ///
    /// Fails with `Conflict` if the year is no longer active (lost race)
    /// or if residents or payments were added to the period between batch
    /// preparation and commit; fails with `NotFound` if the year vanished.
    /// On any failure no partial archive may remain.
    async fn commit_period_close(&self, close: &PeriodClose) -> Result<CalendarYear>;

    // --- residents ---

    async fn insert_resident(&self, resident: &Resident) -> Result<()>;

    async fn residents_in_period(&self, calendar_year_id: Uuid) -> Result<Vec<Resident>>;

    async fn count_residents_in_period(&self, calendar_year_id: Uuid) -> Result<u64>;

    async fn historical_residents_in_period(
        &self,
        calendar_year_id: Uuid,
    ) -> Result<Vec<HistoricalResident>>;

    async fn count_historical_residents_in_period(&self, calendar_year_id: Uuid) -> Result<u64>;

    // --- payments ---

    async fn insert_payment(&self, payment: &Payment) -> Result<()>;

    async fn payments_in_period(&self, calendar_year_id: Uuid) -> Result<Vec<Payment>>;

    async fn count_payments_in_period(&self, calendar_year_id: Uuid) -> Result<u64>;

    /// Every payment referencing the given live resident, regardless of
    /// which period the payment is attributed to.
    async fn payments_for_resident(&self, resident_id: Uuid) -> Result<Vec<Payment>>;

    // --- rooms ---

    async fn insert_room(&self, room: &Room) -> Result<()>;

    /// Active rooms of a hostel.
    async fn rooms_in_hostel(&self, hostel_id: Uuid) -> Result<Vec<Room>>;

    /// Room lookup that includes soft-deleted rows. Archival uses this so
    /// a snapshot still records the room a resident occupied even if the
    /// room was tombstoned mid-period.
    async fn find_room_any_state(&self, id: Uuid) -> Result<Option<Room>>;
}
