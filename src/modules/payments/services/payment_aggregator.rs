// Pure aggregation over recorded payments.
//
// Every function here is deterministic over its inputs: no clock reads, no
// store access. Where "now" matters (the month span of a still-active
// period) the caller passes it in. Percentage math always guards the
// denominator, so callers never see a divide-by-zero panic or a NaN-like
// sentinel.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::payments::{Payment, PaymentMethod};
use crate::modules::residents::ResidentRecord;
use crate::modules::rooms::Room;

/// One calendar month of a period, with its payment activity.
///
/// A bucket exists for every month the period spans even when nothing
/// happened in it; month-over-month charts rely on the gaps being explicit
/// zeros rather than missing entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub year: i32,

    /// 1-based calendar month
    pub month: u32,

    /// Confirmed revenue dated in this month
    pub revenue: Decimal,

    /// All recorded payments dated in this month, regardless of status
    pub payment_count: u64,

    /// Residents whose check-in date falls in this month
    pub new_resident_count: u64,
}

impl MonthlyStats {
    fn empty(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            revenue: Decimal::ZERO,
            payment_count: 0,
            new_resident_count: 0,
        }
    }

    /// "2025-09"-style label for chart axes.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Payment mix for one method. `method = None` is the explicit bucket for
/// payments recorded without a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodBreakdown {
    pub method: Option<PaymentMethod>,
    pub payment_count: u64,
    pub total_amount: Decimal,
}

impl PaymentMethodBreakdown {
    pub fn label(&self) -> String {
        match self.method {
            Some(method) => method.to_string(),
            None => "unspecified".to_string(),
        }
    }
}

/// What one resident owes for the period: room price expected, confirmed
/// amount paid, and the signed balance (negative = credit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentDebt {
    /// Live resident id or historical snapshot id
    pub resident_id: Uuid,
    pub full_name: String,
    pub student_id: String,
    pub archived: bool,
    pub expected_amount: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
}

/// Aggregation formulas for a (hostel, period) payment set.
pub struct PaymentAggregator;

impl PaymentAggregator {
    /// Sum of confirmed payment amounts. Pending, failed and refunded
    /// payments are recorded facts but not revenue.
    pub fn total_revenue(payments: &[Payment]) -> Decimal {
        payments
            .iter()
            .filter(|p| p.is_confirmed())
            .map(|p| p.amount)
            .sum()
    }

    pub fn confirmed_payment_count(payments: &[Payment]) -> u64 {
        payments.iter().filter(|p| p.is_confirmed()).count() as u64
    }

    /// Mean confirmed payment, `0` when there are none.
    pub fn average_payment_amount(payments: &[Payment]) -> Decimal {
        let count = Self::confirmed_payment_count(payments);
        if count == 0 {
            return Decimal::ZERO;
        }
        (Self::total_revenue(payments) / Decimal::from(count)).round_dp(2)
    }

    /// Capacity-based expectation for a live period: each occupied room's
    /// price counted once. Ended periods use the value frozen at close
    /// instead of calling this.
    pub fn expected_revenue(rooms: &[Room]) -> Decimal {
        rooms
            .iter()
            .filter(|r| r.is_occupied())
            .map(|r| r.price)
            .sum()
    }

    /// Share of expected revenue actually collected, as a percentage.
    /// `0` when nothing was expected.
    pub fn collection_rate(revenue: Decimal, expected: Decimal) -> Decimal {
        if expected.is_zero() {
            return Decimal::ZERO;
        }
        (revenue / expected * Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// Revenue change versus the preceding period, as a signed percentage.
    /// `0` when there is no previous period or its revenue was zero;
    /// negative growth is a legitimate result, not an error.
    pub fn revenue_growth(current: Decimal, previous: Option<Decimal>) -> Decimal {
        match previous {
            Some(prev) if !prev.is_zero() => {
                ((current - prev) / prev * Decimal::ONE_HUNDRED).round_dp(2)
            }
            _ => Decimal::ZERO,
        }
    }

    /// Payments and check-ins grouped by calendar month.
    ///
    /// Produces a bucket for every month between `span_start` and
    /// `span_end` inclusive (zero-valued when idle). Payments or check-ins
    /// dated outside the span get their own months appended rather than
    /// being dropped or clamped, so bucket revenue always partitions
    /// [`Self::total_revenue`] exactly.
    pub fn monthly_stats(
        payments: &[Payment],
        records: &[ResidentRecord],
        span_start: DateTime<Utc>,
        span_end: DateTime<Utc>,
    ) -> Vec<MonthlyStats> {
        let mut buckets: BTreeMap<(i32, u32), MonthlyStats> = BTreeMap::new();

        let start = month_floor(span_start.date_naive());
        let end = month_floor(span_end.date_naive());
        let mut cursor = start;
        while cursor <= end {
            let key = (cursor.year(), cursor.month());
            buckets.insert(key, MonthlyStats::empty(key.0, key.1));
            cursor = match cursor.checked_add_months(Months::new(1)) {
                Some(next) => next,
                None => break,
            };
        }

        for payment in payments {
            let date = payment.date.date_naive();
            let key = (date.year(), date.month());
            let bucket = buckets
                .entry(key)
                .or_insert_with(|| MonthlyStats::empty(key.0, key.1));
            bucket.payment_count += 1;
            if payment.is_confirmed() {
                bucket.revenue += payment.amount;
            }
        }

        for record in records {
            let check_in = record.check_in_date();
            let key = (check_in.year(), check_in.month());
            let bucket = buckets
                .entry(key)
                .or_insert_with(|| MonthlyStats::empty(key.0, key.1));
            bucket.new_resident_count += 1;
        }

        buckets.into_values().collect()
    }

    /// Payment mix by method over all recorded payments. Payments without
    /// a method land in the explicit `None` bucket instead of vanishing.
    pub fn payment_method_breakdown(payments: &[Payment]) -> Vec<PaymentMethodBreakdown> {
        let mut buckets: HashMap<Option<PaymentMethod>, PaymentMethodBreakdown> = HashMap::new();

        for payment in payments {
            let bucket =
                buckets
                    .entry(payment.method)
                    .or_insert_with(|| PaymentMethodBreakdown {
                        method: payment.method,
                        payment_count: 0,
                        total_amount: Decimal::ZERO,
                    });
            bucket.payment_count += 1;
            bucket.total_amount += payment.amount;
        }

        let mut breakdowns: Vec<PaymentMethodBreakdown> = buckets.into_values().collect();
        breakdowns.sort_by(|a, b| a.label().cmp(&b.label()));
        breakdowns
    }

    /// Per-resident balance for the period.
    ///
    /// Expected amounts come from the frozen snapshot price for archived
    /// residents and from `live_room_prices` (room id to current price)
    /// for live ones; a resident without a room owes nothing. Paid amounts
    /// sum the confirmed payments attached to each resident.
    pub fn resident_debts(
        records: &[ResidentRecord],
        live_room_prices: &HashMap<Uuid, Decimal>,
        payments: &[Payment],
    ) -> Vec<ResidentDebt> {
        let mut paid_by_live: HashMap<Uuid, Decimal> = HashMap::new();
        let mut paid_by_archived: HashMap<Uuid, Decimal> = HashMap::new();
        for payment in payments.iter().filter(|p| p.is_confirmed()) {
            if let Some(resident_id) = payment.resident_id {
                *paid_by_live.entry(resident_id).or_default() += payment.amount;
            } else if let Some(historical_id) = payment.historical_resident_id {
                *paid_by_archived.entry(historical_id).or_default() += payment.amount;
            }
        }

        let mut debts: Vec<ResidentDebt> = records
            .iter()
            .map(|record| match record {
                ResidentRecord::Live(resident) => {
                    let expected = resident
                        .room_id
                        .and_then(|room_id| live_room_prices.get(&room_id))
                        .copied()
                        .unwrap_or(Decimal::ZERO);
                    let paid = paid_by_live
                        .get(&resident.id)
                        .copied()
                        .unwrap_or(Decimal::ZERO);
                    ResidentDebt {
                        resident_id: resident.id,
                        full_name: resident.full_name.clone(),
                        student_id: resident.student_id.clone(),
                        archived: false,
                        expected_amount: expected,
                        amount_paid: paid,
                        balance_due: expected - paid,
                    }
                }
                ResidentRecord::Archived(snapshot) => {
                    let expected = snapshot.room_price_at_close.unwrap_or(Decimal::ZERO);
                    let paid = paid_by_archived
                        .get(&snapshot.id)
                        .copied()
                        .unwrap_or(Decimal::ZERO);
                    ResidentDebt {
                        resident_id: snapshot.id,
                        full_name: snapshot.full_name.clone(),
                        student_id: snapshot.student_id.clone(),
                        archived: true,
                        expected_amount: expected,
                        amount_paid: paid,
                        balance_due: expected - paid,
                    }
                }
            })
            .collect();

        debts.sort_by(|a, b| {
            a.full_name
                .cmp(&b.full_name)
                .then_with(|| a.student_id.cmp(&b.student_id))
        });
        debts
    }
}

fn month_floor(date: NaiveDate) -> NaiveDate {
    // with_day(1) only fails for invalid dates, which a valid NaiveDate
    // by construction is not.
    date.with_day(1).unwrap_or(date)
}
