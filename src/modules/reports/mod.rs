// Reports module: read-only assembly of period financials for the dashboard

pub mod controllers;
pub mod models;
pub mod services;

pub use models::PeriodReport;
pub use services::ReportService;
