use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::payments::PaymentAggregator;
use crate::modules::periods::CalendarYear;
use crate::modules::reports::models::{
    FinancialSummary, OccupancySummary, PeriodReport, ResidentCounts,
};
use crate::modules::residents::ResidentRecord;
use crate::store::LedgerStore;

/// Report builder: composes the period record, payment aggregation,
/// occupancy figures and per-resident balances into one report.
///
/// Read-only. Runs against whatever consistent snapshot the store
/// provides and takes no locks, so it may execute concurrently with an
/// in-flight period close.
pub struct ReportService {
    store: Arc<dyn LedgerStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Assemble the report for one (hostel, period) pair.
    ///
    /// # Errors
    /// `NotFound` when the hostel or period is absent, or when the period
    /// belongs to a different hostel. A period without data is not an
    /// error: it yields a zero-filled report.
    pub async fn build_report(
        &self,
        hostel_id: Uuid,
        calendar_year_id: Uuid,
    ) -> Result<PeriodReport> {
        self.store
            .find_hostel(hostel_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Hostel '{}' not found", hostel_id)))?;

        let year = self
            .store
            .find_calendar_year(calendar_year_id)
            .await?
            .filter(|y| y.hostel_id == hostel_id)
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Calendar year '{}' not found for hostel '{}'",
                    calendar_year_id, hostel_id
                ))
            })?;

        let payments = self.store.payments_in_period(year.id).await?;
        let live_residents = self.store.residents_in_period(year.id).await?;
        let historical_residents = self.store.historical_residents_in_period(year.id).await?;
        let rooms = self.store.rooms_in_hostel(hostel_id).await?;

        let previous_period_revenue = match self.preceding_period(&year).await? {
            Some(previous) => {
                let previous_payments = self.store.payments_in_period(previous.id).await?;
                Some(PaymentAggregator::total_revenue(&previous_payments))
            }
            None => None,
        };

        // Expected revenue freezes at close so later room-price edits never
        // rewrite historical collection rates; only the active period
        // computes it from current room state.
        let total_expected_revenue = if year.is_ended() {
            year.expected_revenue_at_close.unwrap_or(Decimal::ZERO)
        } else {
            PaymentAggregator::expected_revenue(&rooms)
        };

        let total_revenue = PaymentAggregator::total_revenue(&payments);
        let financials = FinancialSummary::compute(
            total_revenue,
            total_expected_revenue,
            PaymentAggregator::confirmed_payment_count(&payments),
            payments.len() as u64,
            PaymentAggregator::average_payment_amount(&payments),
            previous_period_revenue,
        );

        let occupancy = OccupancySummary::compute(
            rooms.iter().filter(|r| r.is_occupied()).count() as u64,
            rooms.len() as u64,
        );

        let residents = ResidentCounts {
            live: live_residents.len() as u64,
            historical: historical_residents.len() as u64,
        };

        let live_room_prices = self.live_room_prices(&live_residents, &rooms).await?;
        let records: Vec<ResidentRecord> = live_residents
            .into_iter()
            .map(ResidentRecord::Live)
            .chain(
                historical_residents
                    .into_iter()
                    .map(ResidentRecord::Archived),
            )
            .collect();

        // The month span of a still-active period ends "now"; that clock
        // read happens here, never inside the aggregation itself.
        let span_end = year.end_date.unwrap_or_else(Utc::now);
        let monthly_stats =
            PaymentAggregator::monthly_stats(&payments, &records, year.start_date, span_end);
        let payment_methods = PaymentAggregator::payment_method_breakdown(&payments);
        let resident_debts =
            PaymentAggregator::resident_debts(&records, &live_room_prices, &payments);

        let report = PeriodReport {
            hostel_id,
            calendar_year: year,
            financials,
            occupancy,
            residents,
            monthly_stats,
            payment_methods,
            resident_debts,
        };

        if report.is_empty() {
            warn!(
                hostel_id = %hostel_id,
                calendar_year_id = %calendar_year_id,
                "Generated empty period report"
            );
        } else {
            info!(
                hostel_id = %hostel_id,
                calendar_year_id = %calendar_year_id,
                revenue = %report.financials.total_revenue,
                collection_rate = %report.financials.collection_rate,
                "Generated period report"
            );
        }

        Ok(report)
    }

    /// The period immediately before `year` for the same hostel, by start
    /// date. None for the hostel's first period.
    async fn preceding_period(&self, year: &CalendarYear) -> Result<Option<CalendarYear>> {
        let years = self.store.list_calendar_years(year.hostel_id).await?;
        Ok(years
            .into_iter()
            .filter(|y| y.id != year.id && y.start_date < year.start_date)
            .last())
    }

    /// Current price for every room referenced by a live resident.
    ///
    /// Starts from the hostel's active rooms and falls back to an
    /// any-state lookup for residents whose room was tombstoned
    /// mid-period, so their expected amount does not silently drop to
    /// zero while the period is still open.
    async fn live_room_prices(
        &self,
        residents: &[crate::modules::residents::Resident],
        rooms: &[crate::modules::rooms::Room],
    ) -> Result<HashMap<Uuid, Decimal>> {
        let mut prices: HashMap<Uuid, Decimal> =
            rooms.iter().map(|r| (r.id, r.price)).collect();

        for resident in residents {
            if let Some(room_id) = resident.room_id {
                if !prices.contains_key(&room_id) {
                    if let Some(room) = self.store.find_room_any_state(room_id).await? {
                        prices.insert(room_id, room.price);
                    }
                }
            }
        }
        Ok(prices)
    }
}
