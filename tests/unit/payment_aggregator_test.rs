// Property-based tests for the payment aggregation formulas.
//
// The inline unit tests pin the worked examples; these properties check
// the structural guarantees: monthly buckets and method breakdowns
// partition the payment set exactly, aggregation is input-order
// independent, per-resident balances obey the expected - paid identity,
// and the guarded formulas never panic.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use hostelcore::modules::payments::{
    Payment, PaymentAggregator, PaymentMethod, PaymentStatus,
};
use hostelcore::modules::residents::{HistoricalResident, Resident, ResidentRecord};
use hostelcore::modules::rooms::{Room, RoomGender, RoomType};

const STATUSES: [PaymentStatus; 4] = [
    PaymentStatus::Pending,
    PaymentStatus::Confirmed,
    PaymentStatus::Failed,
    PaymentStatus::Refunded,
];

const METHODS: [Option<PaymentMethod>; 5] = [
    None,
    Some(PaymentMethod::Cash),
    Some(PaymentMethod::BankTransfer),
    Some(PaymentMethod::Card),
    Some(PaymentMethod::MobileMoney),
];

fn cents(raw: u64) -> Decimal {
    Decimal::from(raw) / Decimal::from(100)
}

/// (amount in cents, month index into the 2025-09..2026-08 span plus some
/// overflow months outside it, status index, method index)
type PaymentSeed = (u64, u8, u8, u8);

fn payment_from_seed(seed: PaymentSeed) -> Payment {
    let (amount, month_offset, status_idx, method_idx) = seed;
    // Offsets 0..12 land inside the span; 12..18 land after it.
    let year = 2025 + (8 + month_offset as u32) / 12;
    let month = (8 + month_offset as u32) % 12 + 1;
    let date = Utc
        .with_ymd_and_hms(year as i32, month, 15, 12, 0, 0)
        .single()
        .expect("valid payment date");

    Payment::record(
        Uuid::new_v4(),
        None,
        Uuid::new_v4(),
        cents(amount),
        date,
        STATUSES[status_idx as usize % STATUSES.len()],
        METHODS[method_idx as usize % METHODS.len()],
    )
    .expect("valid payment")
}

fn seed_strategy() -> impl Strategy<Value = Vec<PaymentSeed>> {
    proptest::collection::vec(
        (0u64..5_000_000, 0u8..18, 0u8..4, 0u8..5),
        0..40,
    )
}

#[test]
fn expected_revenue_counts_each_occupied_room_once() {
    let hostel_id = Uuid::new_v4();
    let mut full = Room::new(hostel_id, "A-1", 4, dec!(700), RoomGender::Mixed, RoomType::Shared)
        .expect("valid room");
    full.occupants = 4;
    let mut partial = Room::new(
        hostel_id,
        "A-2",
        2,
        dec!(500),
        RoomGender::Female,
        RoomType::Shared,
    )
    .expect("valid room");
    partial.occupants = 1;
    let vacant = Room::new(
        hostel_id,
        "A-3",
        1,
        dec!(900),
        RoomGender::Male,
        RoomType::Private,
    )
    .expect("valid room");

    // Occupancy is binary for the expectation: a full room and a half
    // empty one both contribute their price once, a vacant room none.
    let expected = PaymentAggregator::expected_revenue(&[full, partial, vacant]);
    assert_eq!(expected, dec!(1200));
}

#[test]
fn resident_debts_cover_live_and_archived_sides() {
    let hostel_id = Uuid::new_v4();
    let year_id = Uuid::new_v4();
    let check_in = chrono::NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date");

    let room = Room::new(hostel_id, "B-4", 2, dec!(600), RoomGender::Mixed, RoomType::Shared)
        .expect("valid room");
    let live = Resident::new(
        hostel_id,
        year_id,
        Some(room.id),
        "Amina Yusuf",
        "STU-001",
        None,
        check_in,
    )
    .expect("valid resident");

    let archived_source = Resident::new(
        hostel_id,
        year_id,
        Some(room.id),
        "Brian Otieno",
        "STU-002",
        None,
        check_in,
    )
    .expect("valid resident");
    let snapshot = HistoricalResident::snapshot(&archived_source, Some(&room), Utc::now());

    let live_payment = Payment::record(
        live.id,
        Some(room.id),
        year_id,
        dec!(400),
        Utc::now(),
        PaymentStatus::Confirmed,
        Some(PaymentMethod::Cash),
    )
    .expect("valid payment");
    // A pending payment must not reduce the balance.
    let pending = Payment::record(
        live.id,
        Some(room.id),
        year_id,
        dec!(150),
        Utc::now(),
        PaymentStatus::Pending,
        None,
    )
    .expect("valid payment");
    let mut archived_payment = Payment::record(
        archived_source.id,
        Some(room.id),
        year_id,
        dec!(600),
        Utc::now(),
        PaymentStatus::Confirmed,
        Some(PaymentMethod::BankTransfer),
    )
    .expect("valid payment");
    archived_payment
        .repoint_to_historical(snapshot.id, Utc::now())
        .expect("repoint");

    let records = vec![
        ResidentRecord::Live(live.clone()),
        ResidentRecord::Archived(snapshot.clone()),
    ];
    let mut live_prices = HashMap::new();
    live_prices.insert(room.id, room.price);
    let payments = vec![live_payment, pending, archived_payment];

    let debts = PaymentAggregator::resident_debts(&records, &live_prices, &payments);

    assert_eq!(debts.len(), 2);
    let amina = &debts[0];
    assert_eq!(amina.full_name, "Amina Yusuf");
    assert!(!amina.archived);
    assert_eq!(amina.expected_amount, dec!(600));
    assert_eq!(amina.amount_paid, dec!(400));
    assert_eq!(amina.balance_due, dec!(200));

    let brian = &debts[1];
    assert_eq!(brian.full_name, "Brian Otieno");
    assert!(brian.archived);
    assert_eq!(brian.resident_id, snapshot.id);
    assert_eq!(brian.expected_amount, dec!(600));
    assert_eq!(brian.amount_paid, dec!(600));
    assert_eq!(brian.balance_due, Decimal::ZERO);
}

#[test]
fn roomless_resident_owes_nothing() {
    let live = Resident::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        None,
        "Chen Wei",
        "STU-003",
        None,
        chrono::NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
    )
    .expect("valid resident");

    let debts = PaymentAggregator::resident_debts(
        &[ResidentRecord::Live(live)],
        &HashMap::new(),
        &[],
    );

    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0].expected_amount, Decimal::ZERO);
    assert_eq!(debts[0].balance_due, Decimal::ZERO);
}

proptest! {
    /// Bucket revenue partitions total revenue and bucket counts
    /// partition the payment list, even when payments fall outside the
    /// requested span.
    #[test]
    fn prop_monthly_buckets_partition_payments(seeds in seed_strategy()) {
        let payments: Vec<Payment> = seeds.into_iter().map(payment_from_seed).collect();

        let span_start = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).single().unwrap();
        let span_end = Utc.with_ymd_and_hms(2026, 8, 31, 0, 0, 0).single().unwrap();
        let stats = PaymentAggregator::monthly_stats(&payments, &[], span_start, span_end);

        let bucket_revenue: Decimal = stats.iter().map(|s| s.revenue).sum();
        prop_assert_eq!(bucket_revenue, PaymentAggregator::total_revenue(&payments));

        let bucket_count: u64 = stats.iter().map(|s| s.payment_count).sum();
        prop_assert_eq!(bucket_count, payments.len() as u64);

        // The twelve span months are always present, labelled in order.
        prop_assert!(stats.len() >= 12);
        let labels: Vec<String> = stats.iter().map(|s| s.label()).collect();
        let mut sorted = labels.clone();
        sorted.sort();
        prop_assert_eq!(labels, sorted);
    }

    /// Every payment lands in exactly one method bucket.
    #[test]
    fn prop_method_breakdown_partitions_payments(seeds in seed_strategy()) {
        let payments: Vec<Payment> = seeds.into_iter().map(payment_from_seed).collect();

        let breakdown = PaymentAggregator::payment_method_breakdown(&payments);

        let bucket_count: u64 = breakdown.iter().map(|b| b.payment_count).sum();
        prop_assert_eq!(bucket_count, payments.len() as u64);

        let bucket_amount: Decimal = breakdown.iter().map(|b| b.total_amount).sum();
        let gross: Decimal = payments.iter().map(|p| p.amount).sum();
        prop_assert_eq!(bucket_amount, gross);

        prop_assert!(breakdown.len() <= METHODS.len());
    }

    /// Aggregation reads the payment set, not its ordering.
    #[test]
    fn prop_aggregation_is_order_independent(seeds in seed_strategy()) {
        let payments: Vec<Payment> = seeds.into_iter().map(payment_from_seed).collect();
        let mut reversed = payments.clone();
        reversed.reverse();

        prop_assert_eq!(
            PaymentAggregator::total_revenue(&payments),
            PaymentAggregator::total_revenue(&reversed)
        );
        prop_assert_eq!(
            PaymentAggregator::average_payment_amount(&payments),
            PaymentAggregator::average_payment_amount(&reversed)
        );

        let span_start = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).single().unwrap();
        let span_end = Utc.with_ymd_and_hms(2026, 8, 31, 0, 0, 0).single().unwrap();
        prop_assert_eq!(
            PaymentAggregator::monthly_stats(&payments, &[], span_start, span_end),
            PaymentAggregator::monthly_stats(&reversed, &[], span_start, span_end)
        );
        prop_assert_eq!(
            PaymentAggregator::payment_method_breakdown(&payments),
            PaymentAggregator::payment_method_breakdown(&reversed)
        );
    }

    /// The guarded formulas return zero instead of panicking on empty or
    /// zero-valued denominators.
    #[test]
    fn prop_rate_formulas_never_panic(
        revenue in 0u64..10_000_000,
        expected in 0u64..10_000_000,
        previous in proptest::option::of(0u64..10_000_000),
    ) {
        let rate = PaymentAggregator::collection_rate(cents(revenue), cents(expected));
        if expected == 0 {
            prop_assert_eq!(rate, Decimal::ZERO);
        } else {
            prop_assert!(rate >= Decimal::ZERO);
        }

        let growth =
            PaymentAggregator::revenue_growth(cents(revenue), previous.map(cents));
        match previous {
            None | Some(0) => prop_assert_eq!(growth, Decimal::ZERO),
            Some(prev) => {
                let expected_growth = ((cents(revenue) - cents(prev)) / cents(prev)
                    * Decimal::ONE_HUNDRED)
                    .round_dp(2);
                prop_assert_eq!(growth, expected_growth);
            }
        }
    }

    /// balance_due is exactly expected - paid for every resident, live or
    /// archived, and the rows come back sorted by name.
    #[test]
    fn prop_debt_balance_identity(
        rows in proptest::collection::vec(
            (0u64..200_000, 0u64..300_000, proptest::bool::ANY),
            1..8,
        ),
    ) {
        let hostel_id = Uuid::new_v4();
        let year_id = Uuid::new_v4();
        let check_in = chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();

        let mut records = Vec::new();
        let mut live_prices = HashMap::new();
        let mut payments = Vec::new();
        let mut expected_by_name: HashMap<String, (Decimal, Decimal)> = HashMap::new();

        for (i, (price, paid, archived)) in rows.into_iter().enumerate() {
            let name = format!("Resident {:02}", i);
            let room = Room::new(
                hostel_id,
                format!("R-{:02}", i),
                2,
                cents(price),
                RoomGender::Mixed,
                RoomType::Shared,
            )
            .unwrap();
            let resident = Resident::new(
                hostel_id,
                year_id,
                Some(room.id),
                name.clone(),
                format!("STU-{:03}", i),
                None,
                check_in,
            )
            .unwrap();

            let mut payment = Payment::record(
                resident.id,
                Some(room.id),
                year_id,
                cents(paid),
                Utc::now(),
                PaymentStatus::Confirmed,
                None,
            )
            .unwrap();

            if archived {
                let snapshot = HistoricalResident::snapshot(&resident, Some(&room), Utc::now());
                payment.repoint_to_historical(snapshot.id, Utc::now()).unwrap();
                records.push(ResidentRecord::Archived(snapshot));
            } else {
                live_prices.insert(room.id, room.price);
                records.push(ResidentRecord::Live(resident));
            }
            payments.push(payment);
            expected_by_name.insert(name, (cents(price), cents(paid)));
        }

        let debts = PaymentAggregator::resident_debts(&records, &live_prices, &payments);

        prop_assert_eq!(debts.len(), records.len());
        for debt in &debts {
            let (expected, paid) = expected_by_name[&debt.full_name];
            prop_assert_eq!(debt.expected_amount, expected);
            prop_assert_eq!(debt.amount_paid, paid);
            prop_assert_eq!(debt.balance_due, expected - paid);
        }
        let names: Vec<&str> = debts.iter().map(|d| d.full_name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        prop_assert_eq!(names, sorted);
    }
}
