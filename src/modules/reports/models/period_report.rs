use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::payments::{MonthlyStats, PaymentAggregator, PaymentMethodBreakdown, ResidentDebt};
use crate::modules::periods::CalendarYear;

/// Aggregate financial and occupancy report for one (hostel, period) pair.
///
/// A period with no payments or residents yields a zero-filled report, not
/// an error: "nothing to show" is a renderable result the dashboard can
/// tell apart from "something went wrong".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodReport {
    pub hostel_id: Uuid,
    pub calendar_year: CalendarYear,
    pub financials: FinancialSummary,
    pub occupancy: OccupancySummary,
    pub residents: ResidentCounts,
    pub monthly_stats: Vec<MonthlyStats>,
    pub payment_methods: Vec<PaymentMethodBreakdown>,
    pub resident_debts: Vec<ResidentDebt>,
}

impl PeriodReport {
    /// True when the period has no payment or resident data at all.
    pub fn is_empty(&self) -> bool {
        self.financials.total_payment_count == 0
            && self.residents.live == 0
            && self.residents.historical == 0
    }
}

/// Revenue figures for the period, with growth against the immediately
/// preceding period of the same hostel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_revenue: Decimal,

    /// Capacity expectation: frozen at close for ended periods, computed
    /// from current occupied-room prices for the active one
    pub total_expected_revenue: Decimal,

    /// Percentage of expected revenue collected, `0` when nothing expected
    pub collection_rate: Decimal,

    pub average_payment_amount: Decimal,

    pub confirmed_payment_count: u64,

    /// All recorded payments including pending/failed/refunded
    pub total_payment_count: u64,

    /// Confirmed revenue of the preceding period, absent for the first
    pub previous_period_revenue: Option<Decimal>,

    /// Signed percentage change versus the preceding period, `0` without one
    pub revenue_growth: Decimal,
}

/// Room occupancy figures read from the Room collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancySummary {
    pub occupied_rooms: u64,
    pub total_rooms: u64,
    pub occupancy_rate: Decimal,
}

impl OccupancySummary {
    /// `occupied / total × 100` with the usual zero-denominator guard.
    pub fn compute(occupied: u64, total: u64) -> Self {
        let occupancy_rate = if total == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(occupied) / Decimal::from(total) * Decimal::ONE_HUNDRED).round_dp(2)
        };
        Self {
            occupied_rooms: occupied,
            total_rooms: total,
            occupancy_rate,
        }
    }
}

/// How many residents the period has on each side of the live/historical
/// split. For an ended period `live` is 0 by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentCounts {
    pub live: u64,
    pub historical: u64,
}

impl ResidentCounts {
    pub fn total(&self) -> u64 {
        self.live + self.historical
    }
}

/// Convenience for assembling the financial block from aggregator inputs.
impl FinancialSummary {
    pub fn compute(
        total_revenue: Decimal,
        total_expected_revenue: Decimal,
        confirmed_payment_count: u64,
        total_payment_count: u64,
        average_payment_amount: Decimal,
        previous_period_revenue: Option<Decimal>,
    ) -> Self {
        Self {
            total_revenue,
            total_expected_revenue,
            collection_rate: PaymentAggregator::collection_rate(
                total_revenue,
                total_expected_revenue,
            ),
            average_payment_amount,
            confirmed_payment_count,
            total_payment_count,
            previous_period_revenue,
            revenue_growth: PaymentAggregator::revenue_growth(
                total_revenue,
                previous_period_revenue,
            ),
        }
    }
}
