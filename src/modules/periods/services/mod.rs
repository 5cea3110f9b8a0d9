pub mod period_service;

pub use period_service::PeriodService;
