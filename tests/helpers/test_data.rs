// Seed builders for the period/ledger integration tests.
//
// Everything goes through the public store and model APIs; nothing here
// reaches into internals. Ids are fresh per call so tests stay isolated.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use hostelcore::modules::hostels::Hostel;
use hostelcore::modules::payments::{Payment, PaymentMethod, PaymentStatus};
use hostelcore::modules::periods::CalendarYear;
use hostelcore::modules::residents::Resident;
use hostelcore::modules::rooms::{Room, RoomGender, RoomType};
use hostelcore::store::{InMemoryLedgerStore, LedgerStore};

/// Fresh in-memory store holding one active hostel.
pub async fn seeded_store() -> (Arc<InMemoryLedgerStore>, Hostel) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let hostel = Hostel::new(format!("Test Hostel {}", Uuid::new_v4())).expect("valid hostel");
    store.insert_hostel(&hostel).await.expect("insert hostel");
    (store, hostel)
}

/// An active period inserted directly with a fixed start date, for
/// scenarios where the month span must be deterministic.
pub async fn open_period_at(
    store: &dyn LedgerStore,
    hostel_id: Uuid,
    name: &str,
    start: DateTime<Utc>,
) -> CalendarYear {
    let year = CalendarYear::open(hostel_id, name, start).expect("valid period");
    let inserted = store
        .insert_calendar_year_if_no_active(&year)
        .await
        .expect("insert period");
    assert!(inserted, "hostel already had an active period");
    year
}

/// Room with the given occupancy already counted, inserted into the store.
pub async fn occupied_room(
    store: &dyn LedgerStore,
    hostel_id: Uuid,
    number: &str,
    price: Decimal,
    occupants: u32,
) -> Room {
    let mut room = Room::new(hostel_id, number, 4, price, RoomGender::Mixed, RoomType::Shared)
        .expect("valid room");
    room.occupants = occupants;
    store.insert_room(&room).await.expect("insert room");
    room
}

/// Live resident checked in on the given date, inserted into the store.
pub async fn checked_in_resident(
    store: &dyn LedgerStore,
    hostel_id: Uuid,
    calendar_year_id: Uuid,
    room_id: Option<Uuid>,
    full_name: &str,
    check_in: NaiveDate,
) -> Resident {
    let resident = Resident::new(
        hostel_id,
        calendar_year_id,
        room_id,
        full_name,
        format!("STU-{}", &Uuid::new_v4().to_string()[..8]),
        None,
        check_in,
    )
    .expect("valid resident");
    store
        .insert_resident(&resident)
        .await
        .expect("insert resident");
    resident
}

/// Payment against a live resident, inserted into the store.
pub async fn recorded_payment(
    store: &dyn LedgerStore,
    resident: &Resident,
    amount: Decimal,
    date: DateTime<Utc>,
    status: PaymentStatus,
    method: Option<PaymentMethod>,
) -> Payment {
    let payment = Payment::record(
        resident.id,
        resident.room_id,
        resident.calendar_year_id,
        amount,
        date,
        status,
        method,
    )
    .expect("valid payment");
    store
        .insert_payment(&payment)
        .await
        .expect("insert payment");
    payment
}

/// Midday UTC timestamp, convenient for payment dates.
pub fn utc_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Plain calendar date, convenient for check-ins.
pub fn naive_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}
