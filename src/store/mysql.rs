// MySQL-backed ledger store.
//
// Ids are stored as CHAR(36) and parsed back into `Uuid` when rows are
// mapped to domain types. The one-active-period rule is enforced by a
// guarded INSERT .. SELECT plus a generated-column unique index as the
// backstop, so two racing starts can never both land.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::core::{AppError, RecordState, Result};
use crate::modules::hostels::Hostel;
use crate::modules::payments::{Payment, PaymentMethod, PaymentStatus};
use crate::modules::periods::CalendarYear;
use crate::modules::residents::{HistoricalResident, Resident};
use crate::modules::rooms::{Room, RoomGender, RoomType};

use super::{LedgerStore, PeriodClose};

const CALENDAR_YEAR_COLUMNS: &str = "id, hostel_id, name, start_date, end_date, is_active, \
     expected_revenue_at_close, created_at, updated_at";

pub struct MySqlLedgerStore {
    pool: MySqlPool,
}

impl MySqlLedgerStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LedgerStore for MySqlLedgerStore {
    async fn insert_hostel(&self, hostel: &Hostel) -> Result<()> {
        sqlx::query(
            "INSERT INTO hostels (id, name, verified, published, state, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(hostel.id.to_string())
        .bind(&hostel.name)
        .bind(hostel.verified)
        .bind(hostel.published)
        .bind(hostel.state)
        .bind(hostel.created_at)
        .bind(hostel.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_hostel(&self, id: Uuid) -> Result<Option<Hostel>> {
        let row = sqlx::query_as::<_, HostelRow>(
            "SELECT id, name, verified, published, state, created_at, updated_at \
             FROM hostels WHERE id = ? AND state = 'active'",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(HostelRow::into_domain).transpose()
    }

    async fn insert_calendar_year_if_no_active(&self, year: &CalendarYear) -> Result<bool> {
        // Single statement: the insert only happens if no active year holds
        // the hostel. The unique index on (hostel_id where is_active) turns
        // any race that slips through into a unique violation.
        let result = sqlx::query(
            "INSERT INTO calendar_years \
                 (id, hostel_id, name, start_date, end_date, is_active, \
                  expected_revenue_at_close, created_at, updated_at) \
             SELECT ?, ?, ?, ?, NULL, TRUE, NULL, ?, ? FROM DUAL \
             WHERE NOT EXISTS \
                 (SELECT 1 FROM calendar_years WHERE hostel_id = ? AND is_active = TRUE)",
        )
        .bind(year.id.to_string())
        .bind(year.hostel_id.to_string())
        .bind(&year.name)
        .bind(year.start_date)
        .bind(year.created_at)
        .bind(year.updated_at)
        .bind(year.hostel_id.to_string())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            Err(e) => {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return Ok(false);
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn find_calendar_year(&self, id: Uuid) -> Result<Option<CalendarYear>> {
        let row = sqlx::query_as::<_, CalendarYearRow>(&format!(
            "SELECT {} FROM calendar_years WHERE id = ?",
            CALENDAR_YEAR_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(CalendarYearRow::into_domain).transpose()
    }

    async fn find_active_calendar_year(&self, hostel_id: Uuid) -> Result<Option<CalendarYear>> {
        let row = sqlx::query_as::<_, CalendarYearRow>(&format!(
            "SELECT {} FROM calendar_years WHERE hostel_id = ? AND is_active = TRUE",
            CALENDAR_YEAR_COLUMNS
        ))
        .bind(hostel_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(CalendarYearRow::into_domain).transpose()
    }

    async fn list_calendar_years(&self, hostel_id: Uuid) -> Result<Vec<CalendarYear>> {
        let rows = sqlx::query_as::<_, CalendarYearRow>(&format!(
            "SELECT {} FROM calendar_years WHERE hostel_id = ? ORDER BY start_date ASC",
            CALENDAR_YEAR_COLUMNS
        ))
        .bind(hostel_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CalendarYearRow::into_domain).collect()
    }

    async fn update_calendar_year_name(
        &self,
        id: Uuid,
        name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE calendar_years SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(updated_at)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_calendar_year(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM calendar_years WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await;

        // The RESTRICT foreign keys refuse the delete when a dependent
        // row slipped in after the caller's pre-check.
        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) => {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_foreign_key_violation() {
                        return Err(AppError::conflict(
                            "Calendar year still has dependent records",
                        ));
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn commit_period_close(&self, close: &PeriodClose) -> Result<CalendarYear> {
        // Every early return drops the transaction, which rolls it back.
        let mut tx = self.pool.begin().await?;
        let year_id = close.calendar_year_id.to_string();

        let current = sqlx::query_as::<_, CalendarYearRow>(&format!(
            "SELECT {} FROM calendar_years WHERE id = ? FOR UPDATE",
            CALENDAR_YEAR_COLUMNS
        ))
        .bind(&year_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "Calendar year '{}' not found",
                close.calendar_year_id
            ))
        })?;
        if !current.is_active {
            return Err(AppError::conflict("Calendar year is already ended"));
        }

        sqlx::query(
            "UPDATE calendar_years \
             SET is_active = FALSE, end_date = ?, expected_revenue_at_close = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(close.end_date)
        .bind(close.expected_revenue_at_close)
        .bind(close.end_date)
        .bind(&year_id)
        .execute(&mut *tx)
        .await?;

        for snapshot in &close.batch.snapshots {
            sqlx::query(
                "INSERT INTO historical_residents \
                     (id, hostel_id, calendar_year_id, source_resident_id, full_name, \
                      student_id, course, room_number, room_price_at_close, check_in_date, \
                      check_out_date, archived_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(snapshot.id.to_string())
            .bind(snapshot.hostel_id.to_string())
            .bind(snapshot.calendar_year_id.to_string())
            .bind(snapshot.source_resident_id.to_string())
            .bind(&snapshot.full_name)
            .bind(&snapshot.student_id)
            .bind(&snapshot.course)
            .bind(&snapshot.room_number)
            .bind(snapshot.room_price_at_close)
            .bind(snapshot.check_in_date)
            .bind(snapshot.check_out_date)
            .bind(snapshot.archived_at)
            .execute(&mut *tx)
            .await?;
        }

        for repoint in &close.batch.payment_repoints {
            let updated = sqlx::query(
                "UPDATE payments \
                 SET resident_id = NULL, historical_resident_id = ?, updated_at = ? \
                 WHERE id = ? AND resident_id IS NOT NULL",
            )
            .bind(repoint.historical_resident_id.to_string())
            .bind(close.end_date)
            .bind(repoint.payment_id.to_string())
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 0 {
                return Err(AppError::conflict(
                    "Archive batch references a payment that was already re-pointed or removed",
                ));
            }
        }

        // Payments recorded after the batch was prepared are covered by
        // no re-point; at this point every covered payment has been moved,
        // so anything still joined to a resident of the period is late and
        // must abort the close.
        let late_payments: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payments p \
             JOIN residents r ON r.id = p.resident_id \
             WHERE r.calendar_year_id = ?",
        )
        .bind(&year_id)
        .fetch_one(&mut *tx)
        .await?;
        if late_payments > 0 {
            return Err(AppError::conflict(format!(
                "{} payment(s) were recorded during close; retry",
                late_payments
            )));
        }

        for resident_id in &close.batch.retired_resident_ids {
            sqlx::query("DELETE FROM residents WHERE id = ?")
                .bind(resident_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        // Residents inserted after the batch was prepared survive the
        // deletes above and must abort the close.
        let stragglers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM residents WHERE calendar_year_id = ?")
                .bind(&year_id)
                .fetch_one(&mut *tx)
                .await?;
        if stragglers > 0 {
            return Err(AppError::conflict(format!(
                "{} resident(s) joined the period during close; retry",
                stragglers
            )));
        }

        let closed = sqlx::query_as::<_, CalendarYearRow>(&format!(
            "SELECT {} FROM calendar_years WHERE id = ?",
            CALENDAR_YEAR_COLUMNS
        ))
        .bind(&year_id)
        .fetch_one(&mut *tx)
        .await?
        .into_domain()?;

        tx.commit().await?;
        Ok(closed)
    }

    async fn insert_resident(&self, resident: &Resident) -> Result<()> {
        sqlx::query(
            "INSERT INTO residents \
                 (id, hostel_id, calendar_year_id, room_id, full_name, student_id, course, \
                  check_in_date, check_out_date, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(resident.id.to_string())
        .bind(resident.hostel_id.to_string())
        .bind(resident.calendar_year_id.to_string())
        .bind(resident.room_id.map(|id| id.to_string()))
        .bind(&resident.full_name)
        .bind(&resident.student_id)
        .bind(&resident.course)
        .bind(resident.check_in_date)
        .bind(resident.check_out_date)
        .bind(resident.created_at)
        .bind(resident.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn residents_in_period(&self, calendar_year_id: Uuid) -> Result<Vec<Resident>> {
        let rows = sqlx::query_as::<_, ResidentRow>(
            "SELECT id, hostel_id, calendar_year_id, room_id, full_name, student_id, course, \
                    check_in_date, check_out_date, created_at, updated_at \
             FROM residents WHERE calendar_year_id = ? ORDER BY id",
        )
        .bind(calendar_year_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ResidentRow::into_domain).collect()
    }

    async fn count_residents_in_period(&self, calendar_year_id: Uuid) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM residents WHERE calendar_year_id = ?")
                .bind(calendar_year_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }

    async fn historical_residents_in_period(
        &self,
        calendar_year_id: Uuid,
    ) -> Result<Vec<HistoricalResident>> {
        let rows = sqlx::query_as::<_, HistoricalResidentRow>(
            "SELECT id, hostel_id, calendar_year_id, source_resident_id, full_name, student_id, \
                    course, room_number, room_price_at_close, check_in_date, check_out_date, \
                    archived_at \
             FROM historical_residents WHERE calendar_year_id = ? ORDER BY id",
        )
        .bind(calendar_year_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(HistoricalResidentRow::into_domain)
            .collect()
    }

    async fn count_historical_residents_in_period(&self, calendar_year_id: Uuid) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM historical_residents WHERE calendar_year_id = ?",
        )
        .bind(calendar_year_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<()> {
        sqlx::query(
            "INSERT INTO payments \
                 (id, resident_id, historical_resident_id, room_id, calendar_year_id, amount, \
                  date, status, method, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(payment.id.to_string())
        .bind(payment.resident_id.map(|id| id.to_string()))
        .bind(payment.historical_resident_id.map(|id| id.to_string()))
        .bind(payment.room_id.map(|id| id.to_string()))
        .bind(payment.calendar_year_id.to_string())
        .bind(payment.amount)
        .bind(payment.date)
        .bind(payment.status)
        .bind(payment.method)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn payments_in_period(&self, calendar_year_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, resident_id, historical_resident_id, room_id, calendar_year_id, amount, \
                    date, status, method, created_at, updated_at \
             FROM payments WHERE calendar_year_id = ? ORDER BY date, id",
        )
        .bind(calendar_year_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PaymentRow::into_domain).collect()
    }

    async fn count_payments_in_period(&self, calendar_year_id: Uuid) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE calendar_year_id = ?")
                .bind(calendar_year_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }

    async fn payments_for_resident(&self, resident_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, resident_id, historical_resident_id, room_id, calendar_year_id, amount, \
                    date, status, method, created_at, updated_at \
             FROM payments WHERE resident_id = ? ORDER BY date, id",
        )
        .bind(resident_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PaymentRow::into_domain).collect()
    }

    async fn insert_room(&self, room: &Room) -> Result<()> {
        sqlx::query(
            "INSERT INTO rooms \
                 (id, hostel_id, number, capacity, price, gender, room_type, occupants, state, \
                  created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(room.id.to_string())
        .bind(room.hostel_id.to_string())
        .bind(&room.number)
        .bind(room.capacity)
        .bind(room.price)
        .bind(room.gender)
        .bind(room.room_type)
        .bind(room.occupants)
        .bind(room.state)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn rooms_in_hostel(&self, hostel_id: Uuid) -> Result<Vec<Room>> {
        let rows = sqlx::query_as::<_, RoomRow>(
            "SELECT id, hostel_id, number, capacity, price, gender, room_type, occupants, state, \
                    created_at, updated_at \
             FROM rooms WHERE hostel_id = ? AND state = 'active' ORDER BY number",
        )
        .bind(hostel_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RoomRow::into_domain).collect()
    }

    async fn find_room_any_state(&self, id: Uuid) -> Result<Option<Room>> {
        let row = sqlx::query_as::<_, RoomRow>(
            "SELECT id, hostel_id, number, capacity, price, gender, room_type, occupants, state, \
                    created_at, updated_at \
             FROM rooms WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(RoomRow::into_domain).transpose()
    }
}

// Row helpers: id columns come back as CHAR(36) strings.

fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| AppError::internal(format!("Invalid UUID in column '{}': {}", column, value)))
}

fn parse_uuid_opt(value: Option<String>, column: &str) -> Result<Option<Uuid>> {
    value.map(|v| parse_uuid(&v, column)).transpose()
}

#[derive(Debug, sqlx::FromRow)]
struct HostelRow {
    id: String,
    name: String,
    verified: bool,
    published: bool,
    state: RecordState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl HostelRow {
    fn into_domain(self) -> Result<Hostel> {
        Ok(Hostel {
            id: parse_uuid(&self.id, "hostels.id")?,
            name: self.name,
            verified: self.verified,
            published: self.published,
            state: self.state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CalendarYearRow {
    id: String,
    hostel_id: String,
    name: String,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    is_active: bool,
    expected_revenue_at_close: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CalendarYearRow {
    fn into_domain(self) -> Result<CalendarYear> {
        Ok(CalendarYear {
            id: parse_uuid(&self.id, "calendar_years.id")?,
            hostel_id: parse_uuid(&self.hostel_id, "calendar_years.hostel_id")?,
            name: self.name,
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active,
            expected_revenue_at_close: self.expected_revenue_at_close,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ResidentRow {
    id: String,
    hostel_id: String,
    calendar_year_id: String,
    room_id: Option<String>,
    full_name: String,
    student_id: String,
    course: Option<String>,
    check_in_date: NaiveDate,
    check_out_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResidentRow {
    fn into_domain(self) -> Result<Resident> {
        Ok(Resident {
            id: parse_uuid(&self.id, "residents.id")?,
            hostel_id: parse_uuid(&self.hostel_id, "residents.hostel_id")?,
            calendar_year_id: parse_uuid(&self.calendar_year_id, "residents.calendar_year_id")?,
            room_id: parse_uuid_opt(self.room_id, "residents.room_id")?,
            full_name: self.full_name,
            student_id: self.student_id,
            course: self.course,
            check_in_date: self.check_in_date,
            check_out_date: self.check_out_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoricalResidentRow {
    id: String,
    hostel_id: String,
    calendar_year_id: String,
    source_resident_id: String,
    full_name: String,
    student_id: String,
    course: Option<String>,
    room_number: Option<String>,
    room_price_at_close: Option<Decimal>,
    check_in_date: NaiveDate,
    check_out_date: Option<NaiveDate>,
    archived_at: DateTime<Utc>,
}

impl HistoricalResidentRow {
    fn into_domain(self) -> Result<HistoricalResident> {
        Ok(HistoricalResident {
            id: parse_uuid(&self.id, "historical_residents.id")?,
            hostel_id: parse_uuid(&self.hostel_id, "historical_residents.hostel_id")?,
            calendar_year_id: parse_uuid(
                &self.calendar_year_id,
                "historical_residents.calendar_year_id",
            )?,
            source_resident_id: parse_uuid(
                &self.source_resident_id,
                "historical_residents.source_resident_id",
            )?,
            full_name: self.full_name,
            student_id: self.student_id,
            course: self.course,
            room_number: self.room_number,
            room_price_at_close: self.room_price_at_close,
            check_in_date: self.check_in_date,
            check_out_date: self.check_out_date,
            archived_at: self.archived_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: String,
    resident_id: Option<String>,
    historical_resident_id: Option<String>,
    room_id: Option<String>,
    calendar_year_id: String,
    amount: Decimal,
    date: DateTime<Utc>,
    status: PaymentStatus,
    method: Option<PaymentMethod>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_domain(self) -> Result<Payment> {
        Ok(Payment {
            id: parse_uuid(&self.id, "payments.id")?,
            resident_id: parse_uuid_opt(self.resident_id, "payments.resident_id")?,
            historical_resident_id: parse_uuid_opt(
                self.historical_resident_id,
                "payments.historical_resident_id",
            )?,
            room_id: parse_uuid_opt(self.room_id, "payments.room_id")?,
            calendar_year_id: parse_uuid(&self.calendar_year_id, "payments.calendar_year_id")?,
            amount: self.amount,
            date: self.date,
            status: self.status,
            method: self.method,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoomRow {
    id: String,
    hostel_id: String,
    number: String,
    capacity: u32,
    price: Decimal,
    gender: RoomGender,
    room_type: RoomType,
    occupants: u32,
    state: RecordState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_domain(self) -> Result<Room> {
        Ok(Room {
            id: parse_uuid(&self.id, "rooms.id")?,
            hostel_id: parse_uuid(&self.hostel_id, "rooms.hostel_id")?,
            number: self.number,
            capacity: self.capacity,
            price: self.price,
            gender: self.gender,
            room_type: self.room_type,
            occupants: self.occupants,
            state: self.state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
