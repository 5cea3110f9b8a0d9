use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::core::AppError;
use crate::modules::payments::{MonthlyStats, PaymentMethodBreakdown, ResidentDebt};
use crate::modules::periods::controllers::period_controller::CalendarYearResponse;
use crate::modules::reports::models::{
    FinancialSummary, OccupancySummary, PeriodReport, ResidentCounts,
};
use crate::modules::reports::services::ReportService;

/// Full period report as returned to the dashboard.
#[derive(Debug, Serialize)]
pub struct PeriodReportResponse {
    pub hostel_id: Uuid,
    pub calendar_year: CalendarYearResponse,
    pub financials: FinancialSummaryResponse,
    pub occupancy: OccupancySummaryResponse,
    pub residents: ResidentCountsResponse,
    pub monthly_stats: Vec<MonthlyStatsResponse>,
    pub payment_methods: Vec<PaymentMethodResponse>,
    pub resident_debts: Vec<ResidentDebtResponse>,
    /// True when the period has no payment or resident data
    pub is_empty: bool,
}

/// Revenue block. Amounts serialize as strings for JSON precision.
#[derive(Debug, Serialize)]
pub struct FinancialSummaryResponse {
    pub total_revenue: String,
    pub total_expected_revenue: String,
    pub collection_rate: String,
    pub average_payment_amount: String,
    pub confirmed_payment_count: u64,
    pub total_payment_count: u64,
    pub previous_period_revenue: Option<String>,
    pub revenue_growth: String,
}

#[derive(Debug, Serialize)]
pub struct OccupancySummaryResponse {
    pub occupied_rooms: u64,
    pub total_rooms: u64,
    pub occupancy_rate: String,
}

#[derive(Debug, Serialize)]
pub struct ResidentCountsResponse {
    pub live: u64,
    pub historical: u64,
    pub total: u64,
}

/// One month of the period span, labelled `YYYY-MM`.
#[derive(Debug, Serialize)]
pub struct MonthlyStatsResponse {
    pub month: String,
    pub revenue: String,
    pub payment_count: u64,
    pub new_resident_count: u64,
}

/// Payment mix for one method; `method` is `"unspecified"` for payments
/// recorded without one.
#[derive(Debug, Serialize)]
pub struct PaymentMethodResponse {
    pub method: String,
    pub payment_count: u64,
    pub total_amount: String,
}

#[derive(Debug, Serialize)]
pub struct ResidentDebtResponse {
    pub resident_id: Uuid,
    pub full_name: String,
    pub student_id: String,
    pub archived: bool,
    pub expected_amount: String,
    pub amount_paid: String,
    pub balance_due: String,
}

impl From<PeriodReport> for PeriodReportResponse {
    fn from(report: PeriodReport) -> Self {
        let is_empty = report.is_empty();
        Self {
            hostel_id: report.hostel_id,
            calendar_year: CalendarYearResponse::from(report.calendar_year),
            financials: FinancialSummaryResponse::from(report.financials),
            occupancy: OccupancySummaryResponse::from(report.occupancy),
            residents: ResidentCountsResponse::from(report.residents),
            monthly_stats: report
                .monthly_stats
                .into_iter()
                .map(MonthlyStatsResponse::from)
                .collect(),
            payment_methods: report
                .payment_methods
                .into_iter()
                .map(PaymentMethodResponse::from)
                .collect(),
            resident_debts: report
                .resident_debts
                .into_iter()
                .map(ResidentDebtResponse::from)
                .collect(),
            is_empty,
        }
    }
}

impl From<FinancialSummary> for FinancialSummaryResponse {
    fn from(financials: FinancialSummary) -> Self {
        Self {
            total_revenue: financials.total_revenue.to_string(),
            total_expected_revenue: financials.total_expected_revenue.to_string(),
            collection_rate: financials.collection_rate.to_string(),
            average_payment_amount: financials.average_payment_amount.to_string(),
            confirmed_payment_count: financials.confirmed_payment_count,
            total_payment_count: financials.total_payment_count,
            previous_period_revenue: financials
                .previous_period_revenue
                .map(|d| d.to_string()),
            revenue_growth: financials.revenue_growth.to_string(),
        }
    }
}

impl From<OccupancySummary> for OccupancySummaryResponse {
    fn from(occupancy: OccupancySummary) -> Self {
        Self {
            occupied_rooms: occupancy.occupied_rooms,
            total_rooms: occupancy.total_rooms,
            occupancy_rate: occupancy.occupancy_rate.to_string(),
        }
    }
}

impl From<ResidentCounts> for ResidentCountsResponse {
    fn from(counts: ResidentCounts) -> Self {
        Self {
            total: counts.total(),
            live: counts.live,
            historical: counts.historical,
        }
    }
}

impl From<MonthlyStats> for MonthlyStatsResponse {
    fn from(stats: MonthlyStats) -> Self {
        Self {
            month: stats.label(),
            revenue: stats.revenue.to_string(),
            payment_count: stats.payment_count,
            new_resident_count: stats.new_resident_count,
        }
    }
}

impl From<PaymentMethodBreakdown> for PaymentMethodResponse {
    fn from(breakdown: PaymentMethodBreakdown) -> Self {
        Self {
            method: breakdown.label(),
            payment_count: breakdown.payment_count,
            total_amount: breakdown.total_amount.to_string(),
        }
    }
}

impl From<ResidentDebt> for ResidentDebtResponse {
    fn from(debt: ResidentDebt) -> Self {
        Self {
            resident_id: debt.resident_id,
            full_name: debt.full_name,
            student_id: debt.student_id,
            archived: debt.archived,
            expected_amount: debt.expected_amount.to_string(),
            amount_paid: debt.amount_paid.to_string(),
            balance_due: debt.balance_due.to_string(),
        }
    }
}

/// Fetch the full report for one period
/// GET /hostels/{hostel_id}/periods/{period_id}/report
pub async fn get_period_report(
    service: web::Data<Arc<ReportService>>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (hostel_id, period_id) = path.into_inner();
    let report = service.build_report(hostel_id, period_id).await?;

    Ok(HttpResponse::Ok().json(PeriodReportResponse::from(report)))
}

/// Configure report routes. A single full-path resource: it shares the
/// `/hostels/{hostel_id}/periods/{period_id}` prefix with the period
/// routes, and actix does not backtrack out of a matched scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/hostels/{hostel_id}/periods/{period_id}/report")
            .route(web::get().to(get_period_report)),
    );
}
