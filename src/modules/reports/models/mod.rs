pub mod period_report;

pub use period_report::{FinancialSummary, OccupancySummary, PeriodReport, ResidentCounts};
